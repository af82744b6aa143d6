//! Route handlers, one module per resource.
//!
//! Handlers return [`ApiResult`](crate::middleware::response::ApiResult);
//! errors are rendered by the error-catching stage, never here.

pub mod comments;
pub mod extract;
pub mod posts;
pub mod session;
pub mod tags;
pub mod users;

use crate::error::ApiError;

/// Fallback for every unmatched path or method.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
