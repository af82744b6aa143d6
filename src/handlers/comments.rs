use axum::extract::{Path, RawQuery, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::extract::{check_id, list_options, JsonBody};
use super::posts::{vote_for, VoteBody};
use crate::app::AppState;
use crate::database::models::{Comment, CommentStatus, NewComment, ParentSnapshot, VoteTarget};
use crate::error::ApiError;
use crate::filter::{CommentFilter, SortBy};
use crate::middleware::{response::ApiResult, ApiResponse, RequestContext};
use crate::validation::{Rule, Validator};

/// Deleted comments stay in lists so replies keep their place in the thread.
const VISIBLE: [CommentStatus; 2] = [CommentStatus::Published, CommentStatus::Deleted];

#[derive(Debug, Serialize)]
pub struct CommentList {
    pub comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentBody {
    pub body: Option<String>,
    pub post_id: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentBody {
    pub body: Option<String>,
}

async fn fetch(state: &AppState, filter: CommentFilter) -> ApiResult<CommentList> {
    let comments = state.store.get_comments(&filter).await?;
    info!(
        event = "COMMENTS-FETCHED",
        count = comments.len(),
        post_id = ?filter.post_id,
        search = ?filter.search,
        author = ?filter.author,
        liked_by = ?filter.liked_by,
        sort_by = ?filter.sort_by,
    );
    Ok(ApiResponse::success(CommentList { comments }))
}

/// GET /api/v1/posts/{postId}/comments - The thread under a post, oldest first
pub async fn list_post_comments(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(post_id): Path<String>,
) -> ApiResult<CommentList> {
    check_id(&ctx, "post id", &post_id)?;
    let filter = CommentFilter::new(ctx.username())
        .post_id(post_id)
        .statuses(&VISIBLE)
        .sort_by(SortBy::Oldest);
    fetch(&state, filter).await
}

/// GET /api/v1/users/{username}/comments - Comments the caller wrote
pub async fn list_my_comments(
    State(state): State<AppState>,
    ctx: RequestContext,
    RawQuery(raw): RawQuery,
) -> ApiResult<CommentList> {
    let (query, sort_by) = list_options(&ctx, raw.as_deref())?;
    let filter = CommentFilter::new(ctx.username())
        .author(ctx.username())
        .statuses(&VISIBLE)
        .search(query.query)
        .sort_by(sort_by);
    fetch(&state, filter).await
}

/// GET /api/v1/users/{username}/liked-comments - Comments the caller liked
pub async fn list_liked_comments(
    State(state): State<AppState>,
    ctx: RequestContext,
    RawQuery(raw): RawQuery,
) -> ApiResult<CommentList> {
    let (query, sort_by) = list_options(&ctx, raw.as_deref())?;
    let filter = CommentFilter::new(ctx.username())
        .liked_by(ctx.username())
        .statuses(&VISIBLE)
        .search(query.query)
        .sort_by(sort_by);
    fetch(&state, filter).await
}

/// POST /api/v1/comments/{commentId} - Comment on a post, optionally replying to another comment
pub async fn create_comment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(comment_id): Path<String>,
    JsonBody(body): JsonBody<CreateCommentBody>,
) -> ApiResult<()> {
    Validator::new(&ctx.translator)
        .field("id", &comment_id, &[Rule::Required, Rule::NotBlank, Rule::Uuid4])
        .field("body", &body.body, &[Rule::Required, Rule::NotBlank])
        .field("post id", &body.post_id, &[Rule::Required, Rule::NotBlank, Rule::Uuid4])
        .field("parent id", &body.parent_id, &[Rule::OmitEmpty, Rule::NotBlank, Rule::Uuid4])
        .finish()?;

    let post_id = body.post_id.unwrap_or_default();
    let parent = match body.parent_id.filter(|id| !id.is_empty()) {
        Some(parent_id) => Some(parent_snapshot(&state, &ctx, &post_id, &parent_id).await?),
        None => None,
    };
    let author = ctx.username().to_string();

    state
        .store
        .create_comment(NewComment {
            id: comment_id.clone(),
            body: body.body.unwrap_or_default(),
            author: author.clone(),
            post_id,
            parent,
        })
        .await?;
    state.policies.grant_comment_owner(&author, &comment_id).await?;

    info!(event = "COMMENT-CREATED", comment_id = %comment_id);
    Ok(ApiResponse::created())
}

/// Copy the parent as it reads now. It must sit under the same post.
async fn parent_snapshot(
    state: &AppState,
    ctx: &RequestContext,
    post_id: &str,
    parent_id: &str,
) -> Result<ParentSnapshot, ApiError> {
    let parent = state
        .store
        .get_comment(ctx.username(), parent_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or(ApiError::InvalidForeignKey)?;

    Ok(ParentSnapshot {
        id: parent.id,
        author: parent.author,
        body: parent.body,
    })
}

/// PUT /api/v1/comments/{commentId} - Replace the body; the parent snapshot is left alone
pub async fn update_comment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(comment_id): Path<String>,
    JsonBody(body): JsonBody<UpdateCommentBody>,
) -> ApiResult<()> {
    Validator::new(&ctx.translator)
        .field("id", &comment_id, &[Rule::Required, Rule::NotBlank, Rule::Uuid4])
        .field("body", &body.body, &[Rule::Required, Rule::NotBlank])
        .finish()?;

    state
        .store
        .update_comment(&comment_id, body.body.as_deref().unwrap_or_default())
        .await?;

    info!(event = "COMMENT-UPDATED", comment_id = %comment_id);
    Ok(ApiResponse::no_content())
}

/// DELETE /api/v1/comments/{commentId}
pub async fn delete_comment(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(comment_id): Path<String>,
) -> ApiResult<()> {
    check_id(&ctx, "id", &comment_id)?;
    state.store.soft_delete_comment(&comment_id).await?;

    info!(event = "COMMENT-SOFT-DELETED", comment_id = %comment_id);
    Ok(ApiResponse::no_content())
}

/// PUT /api/v1/comments/{commentId}/vote
pub async fn upsert_comment_vote(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(comment_id): Path<String>,
    JsonBody(body): JsonBody<VoteBody>,
) -> ApiResult<()> {
    let vote = vote_for(&ctx, VoteTarget::Comment(comment_id), body)?;
    state.store.upsert_vote(vote.clone()).await?;

    info!(event = "COMMENT-VOTE-UPSERTED", comment_id = vote.target.id(), vote = %vote.value);
    Ok(ApiResponse::ok())
}

/// DELETE /api/v1/comments/{commentId}/vote
pub async fn delete_comment_vote(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(comment_id): Path<String>,
) -> ApiResult<()> {
    check_id(&ctx, "id", &comment_id)?;
    state
        .store
        .delete_vote(&VoteTarget::Comment(comment_id.clone()), ctx.username())
        .await?;

    info!(event = "COMMENT-VOTE-DELETED", comment_id = %comment_id);
    Ok(ApiResponse::ok())
}
