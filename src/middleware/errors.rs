use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};

use super::context::{ErrorSlot, RequestContext};
use crate::error::ApiError;

/// The one place an [`ApiError`] becomes an HTTP body.
///
/// Installs a fresh error slot, runs the rest of the chain, and renders
/// whatever ended up in the slot. Errors returned by handlers travel back in
/// the response extensions and are moved into the slot first.
pub async fn catch_errors(mut req: Request, next: Next) -> Response {
    let slot = ErrorSlot::default();
    match req.extensions_mut().get_mut::<RequestContext>() {
        Some(ctx) => ctx.errors = slot.clone(),
        None => return render(ApiError::internal("error catcher ran before request logger")),
    }

    let mut response = next.run(req).await;

    if let Some(err) = response.extensions_mut().remove::<ApiError>() {
        slot.set(err);
    }

    match slot.take() {
        Some(err) => render(err),
        None => response,
    }
}

fn render(err: ApiError) -> Response {
    match &err {
        ApiError::Internal { trace_id, detail } => {
            error!(event = err.error_code(), trace_id = %trace_id, error_message = %detail);
        }
        _ => {
            warn!(event = err.error_code(), error_message = %err.message());
        }
    }

    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err.to_json())).into_response()
}
