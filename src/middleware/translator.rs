use axum::{
    extract::{Request, State},
    http::header::ACCEPT_LANGUAGE,
    middleware::Next,
    response::Response,
};

use super::context::RequestContext;
use crate::app::AppState;

/// Pick the caller's message catalog from `Accept-Language`.
pub async fn resolve_translator(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let header = req
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if let Some(ctx) = req.extensions_mut().get_mut::<RequestContext>() {
        ctx.translator = state.translators.for_accept_language(header.as_deref());
    }

    next.run(req).await
}
