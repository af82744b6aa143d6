use axum::extract::{Path, RawQuery, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::extract::{check_id, list_options, JsonBody};
use crate::app::AppState;
use crate::database::models::{NewPost, Post, PostChanges, PostStatus, Vote, VoteTarget, VoteValue};
use crate::error::ApiError;
use crate::filter::PostFilter;
use crate::middleware::{response::ApiResult, ApiResponse, RequestContext};
use crate::validation::{Rule, Validator};

const CREATABLE_STATUSES: [&str; 2] = ["Draft", "Published"];

#[derive(Debug, Serialize)]
pub struct PostList {
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct PostBody {
    pub post: Post,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostBody {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostBody {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct VoteBody {
    pub vote: Option<String>,
}

/// Shared by every post list: the caller supplies search, tags and order,
/// `scope` pins author, status and likes.
async fn list(
    state: &AppState,
    ctx: &RequestContext,
    raw: Option<String>,
    scope: impl FnOnce(PostFilter) -> PostFilter,
) -> ApiResult<PostList> {
    let (query, sort_by) = list_options(ctx, raw.as_deref())?;
    let filter = scope(
        PostFilter::new(ctx.username())
            .search(query.query)
            .tags(&query.tags)
            .sort_by(sort_by),
    );

    let posts = state.store.get_posts(&filter).await?;
    info!(
        event = "POSTS-FETCHED",
        count = posts.len(),
        search = ?filter.search,
        tags = ?filter.tags,
        author = ?filter.author,
        liked_by = ?filter.liked_by,
        sort_by = ?filter.sort_by,
    );
    Ok(ApiResponse::success(PostList { posts }))
}

/// GET /api/v1/posts - Published posts
pub async fn list_posts(
    State(state): State<AppState>,
    ctx: RequestContext,
    RawQuery(raw): RawQuery,
) -> ApiResult<PostList> {
    list(&state, &ctx, raw, |f| f.statuses(&[PostStatus::Published])).await
}

/// GET /api/v1/users/{username}/posts - The caller's published posts
pub async fn list_my_posts(
    State(state): State<AppState>,
    ctx: RequestContext,
    RawQuery(raw): RawQuery,
) -> ApiResult<PostList> {
    let me = ctx.username().to_string();
    list(&state, &ctx, raw, |f| f.author(me).statuses(&[PostStatus::Published])).await
}

/// GET /api/v1/users/{username}/drafts - The caller's drafts
pub async fn list_my_drafts(
    State(state): State<AppState>,
    ctx: RequestContext,
    RawQuery(raw): RawQuery,
) -> ApiResult<PostList> {
    let me = ctx.username().to_string();
    list(&state, &ctx, raw, |f| f.author(me).statuses(&[PostStatus::Draft])).await
}

/// GET /api/v1/users/{username}/liked-posts - Published posts the caller liked
pub async fn list_liked_posts(
    State(state): State<AppState>,
    ctx: RequestContext,
    RawQuery(raw): RawQuery,
) -> ApiResult<PostList> {
    let me = ctx.username().to_string();
    list(&state, &ctx, raw, |f| f.liked_by(me).statuses(&[PostStatus::Published])).await
}

/// GET /api/v1/posts/{postId} - One post. Drafts are only visible to their author.
pub async fn get_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(post_id): Path<String>,
) -> ApiResult<PostBody> {
    check_id(&ctx, "id", &post_id)?;

    let post = state
        .store
        .get_post(ctx.username(), &post_id)
        .await?
        .filter(|p| p.status != PostStatus::Draft || p.author == ctx.username())
        .ok_or(ApiError::NotFound)?;

    info!(event = "POST-FETCHED", post_id = %post_id);
    Ok(ApiResponse::success(PostBody { post }))
}

/// POST /api/v1/posts/{postId} - Create a post under a client-chosen id
pub async fn create_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(post_id): Path<String>,
    JsonBody(body): JsonBody<CreatePostBody>,
) -> ApiResult<()> {
    Validator::new(&ctx.translator)
        .field("id", &post_id, &[Rule::Required, Rule::NotBlank, Rule::Uuid4])
        .field("title", &body.title, &[Rule::Required, Rule::NotBlank])
        .field("body", &body.body, &[Rule::Required, Rule::NotBlank])
        .field("tags", &body.tags, &[Rule::Required, Rule::NotBlank])
        .field("status", &body.status, &[Rule::Required, Rule::OneOf(&CREATABLE_STATUSES)])
        .finish()?;

    let status: PostStatus = body
        .status
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(ApiError::internal)?;
    let author = ctx.username().to_string();

    state
        .store
        .create_post(NewPost {
            id: post_id.clone(),
            title: body.title.unwrap_or_default(),
            body: body.body.unwrap_or_default(),
            tags: body.tags.unwrap_or_default(),
            author: author.clone(),
            status,
        })
        .await?;
    state.policies.grant_post_owner(&author, &post_id).await?;

    info!(event = "POST-CREATED", post_id = %post_id, status = %status);
    Ok(ApiResponse::created())
}

fn post_changes(ctx: &RequestContext, post_id: String, body: UpdatePostBody) -> Result<PostChanges, ApiError> {
    Validator::new(&ctx.translator)
        .field("id", &post_id, &[Rule::Required, Rule::NotBlank, Rule::Uuid4])
        .field("title", &body.title, &[Rule::Required, Rule::NotBlank])
        .field("body", &body.body, &[Rule::Required, Rule::NotBlank])
        .field("tags", &body.tags, &[Rule::Required, Rule::NotBlank])
        .finish()?;

    Ok(PostChanges {
        id: post_id,
        title: body.title.unwrap_or_default(),
        body: body.body.unwrap_or_default(),
        tags: body.tags.unwrap_or_default(),
    })
}

/// PUT /api/v1/posts/{postId} - Replace title, body and tags
pub async fn update_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(post_id): Path<String>,
    JsonBody(body): JsonBody<UpdatePostBody>,
) -> ApiResult<()> {
    let changes = post_changes(&ctx, post_id, body)?;
    state.store.update_post(changes.clone()).await?;

    info!(event = "POST-UPDATED", post_id = %changes.id);
    Ok(ApiResponse::no_content())
}

/// POST /api/v1/posts/{postId}/conversion - Publish a draft with its final content
pub async fn publish_draft(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(post_id): Path<String>,
    JsonBody(body): JsonBody<UpdatePostBody>,
) -> ApiResult<()> {
    let changes = post_changes(&ctx, post_id, body)?;
    state.store.publish_draft(changes.clone()).await?;

    info!(event = "POST-PUBLISHED", post_id = %changes.id);
    Ok(ApiResponse::no_content())
}

/// DELETE /api/v1/posts/{postId} - Soft delete: the row stays, its content goes
pub async fn delete_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(post_id): Path<String>,
) -> ApiResult<()> {
    check_id(&ctx, "id", &post_id)?;
    state.store.soft_delete_post(&post_id).await?;

    info!(event = "POST-SOFT-DELETED", post_id = %post_id);
    Ok(ApiResponse::no_content())
}

/// Validate a vote body and build the vote for `target`.
pub(super) fn vote_for(ctx: &RequestContext, target: VoteTarget, body: VoteBody) -> Result<Vote, ApiError> {
    Validator::new(&ctx.translator)
        .field("id", target.id(), &[Rule::Required, Rule::NotBlank, Rule::Uuid4])
        .field("vote", &body.vote, &[Rule::Required, Rule::OneOf(&VoteValue::ALL)])
        .finish()?;

    let value = body
        .vote
        .as_deref()
        .unwrap_or_default()
        .parse::<VoteValue>()
        .map_err(ApiError::internal)?;

    Ok(Vote {
        viewer: ctx.username().to_string(),
        target,
        value,
    })
}

/// PUT /api/v1/posts/{postId}/vote - Like or dislike; voting again replaces the vote
pub async fn upsert_post_vote(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(post_id): Path<String>,
    JsonBody(body): JsonBody<VoteBody>,
) -> ApiResult<()> {
    let vote = vote_for(&ctx, VoteTarget::Post(post_id), body)?;
    state.store.upsert_vote(vote.clone()).await?;

    info!(event = "POST-VOTE-UPSERTED", post_id = vote.target.id(), vote = %vote.value);
    Ok(ApiResponse::ok())
}

/// DELETE /api/v1/posts/{postId}/vote - Withdraw the caller's vote
pub async fn delete_post_vote(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(post_id): Path<String>,
) -> ApiResult<()> {
    check_id(&ctx, "id", &post_id)?;
    state
        .store
        .delete_vote(&VoteTarget::Post(post_id.clone()), ctx.username())
        .await?;

    info!(event = "POST-VOTE-DELETED", post_id = %post_id);
    Ok(ApiResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Span;
    use uuid::Uuid;

    const ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

    fn ctx_for(username: &str) -> RequestContext {
        let mut ctx = RequestContext::new(Uuid::new_v4(), Span::none());
        ctx.identity = crate::middleware::Identity::user(username);
        ctx
    }

    #[test]
    fn test_post_changes_collects_every_failure() {
        let body = UpdatePostBody {
            title: Some(" ".into()),
            body: None,
            tags: Some(vec![]),
        };
        match post_changes(&ctx_for("alice"), "nope".into(), body) {
            Err(ApiError::Validation(messages)) => assert_eq!(messages.len(), 4),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_vote_for_uses_caller() {
        let body = VoteBody {
            vote: Some("Dislike".into()),
        };
        let vote = vote_for(&ctx_for("bob"), VoteTarget::Post(ID.into()), body).unwrap();
        assert_eq!(vote.viewer, "bob");
        assert_eq!(vote.value, VoteValue::Dislike);
    }

    #[test]
    fn test_vote_for_rejects_unknown_value() {
        let body = VoteBody {
            vote: Some("Love".into()),
        };
        assert!(matches!(
            vote_for(&ctx_for("bob"), VoteTarget::Post(ID.into()), body),
            Err(ApiError::Validation(_))
        ));
    }
}
