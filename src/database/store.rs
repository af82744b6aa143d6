use async_trait::async_trait;

use crate::database::models::{
    Comment, NewComment, NewPost, NewUser, Post, PostChanges, User, Vote, VoteTarget,
};
use crate::database::DatabaseError;
use crate::filter::{CommentFilter, PostFilter};

pub type StoreResult<T> = Result<T, DatabaseError>;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<()>;
    async fn get_user(&self, username: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Insert the row and its tag mappings atomically.
    async fn create_post(&self, post: NewPost) -> StoreResult<()>;
    async fn get_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>>;
    async fn get_post(&self, viewer: &str, id: &str) -> StoreResult<Option<Post>>;
    /// Replace title, body and the full tag set. `NotFound` for missing or deleted posts.
    async fn update_post(&self, changes: PostChanges) -> StoreResult<()>;
    /// Draft to Published, resetting `created_at`. `NotFound` unless the post is a draft.
    async fn publish_draft(&self, changes: PostChanges) -> StoreResult<()>;
    async fn soft_delete_post(&self, id: &str) -> StoreResult<()>;
    /// Every distinct tag string in use, sorted.
    async fn get_tags(&self) -> StoreResult<Vec<String>>;
}

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn create_comment(&self, comment: NewComment) -> StoreResult<()>;
    async fn get_comments(&self, filter: &CommentFilter) -> StoreResult<Vec<Comment>>;
    async fn get_comment(&self, viewer: &str, id: &str) -> StoreResult<Option<Comment>>;
    /// Body only. The parent snapshot is fixed at creation.
    async fn update_comment(&self, id: &str, body: &str) -> StoreResult<()>;
    async fn soft_delete_comment(&self, id: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait VoteRepo: Send + Sync {
    /// Insert or overwrite the viewer's vote on the target.
    async fn upsert_vote(&self, vote: Vote) -> StoreResult<()>;
    /// Remove the viewer's vote. Succeeds when there was none.
    async fn delete_vote(&self, target: &VoteTarget, viewer: &str) -> StoreResult<()>;
}

pub trait Store: UserRepo + PostRepo + CommentRepo + VoteRepo {}

impl<T> Store for T where T: UserRepo + PostRepo + CommentRepo + VoteRepo {}
