use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::info;

use super::context::RequestContext;
use crate::app::AppState;
use crate::error::ApiError;

/// Check (caller, full request path, verb) against the policy store.
/// A denial short-circuits: the handler never runs.
pub async fn authorize(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(ctx) = req.extensions().get::<RequestContext>().cloned() else {
        return ApiError::internal("authorization ran before request logger").into_response();
    };

    // Nested routers see a stripped URI; policies are written against the full path
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let method = req.method().as_str().to_string();

    match state.policies.is_allowed(ctx.username(), &path, &method).await {
        Ok(true) => {
            info!(event = "USER-AUTHORISED", username = ctx.username(), resource = %path, method = %method);
            next.run(req).await
        }
        Ok(false) => ctx.fail(ApiError::Unauthorised),
        Err(err) => ctx.fail(err.into()),
    }
}
