use axum::extract::State;
use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::middleware::{response::ApiResult, ApiResponse};

#[derive(Debug, Serialize)]
pub struct TagList {
    pub tags: Vec<String>,
}

/// GET /api/v1/tags - Every tag in use, sorted
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<TagList> {
    let tags = state.store.get_tags().await?;
    info!(event = "TAGS-FETCHED", count = tags.len());
    Ok(ApiResponse::success(TagList { tags }))
}
