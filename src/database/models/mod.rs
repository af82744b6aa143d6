pub mod comment;
pub mod post;
pub mod user;
pub mod vote;

pub use comment::{Comment, CommentStatus, NewComment, ParentSnapshot};
pub use post::{NewPost, Post, PostChanges, PostStatus};
pub use user::{NewUser, User};
pub use vote::{Vote, VoteTarget, VoteValue};

/// Raised when a stored enum column holds a value outside its variant set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
