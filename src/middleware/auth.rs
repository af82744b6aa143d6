use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use super::context::{Identity, RequestContext};
use crate::app::AppState;
use crate::auth::verify_token;
use crate::error::ApiError;

/// Resolve the caller from the session cookie or a bearer token.
///
/// Missing or invalid credentials are not an error here: the caller simply
/// stays anonymous and authorization decides what that means.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let security = &state.config.security;
    let identity = match extract_token(req.headers(), &security.auth_cookie_name) {
        Some(token) => match verify_token(&token, security) {
            Ok(claims) => Identity::user(claims.sub),
            Err(err) => {
                debug!(event = "INVALID-CREDENTIALS", error_message = %err);
                Identity::anonymous()
            }
        },
        None => Identity::anonymous(),
    };

    let Some(ctx) = req.extensions_mut().get_mut::<RequestContext>() else {
        return ApiError::internal("authentication ran before request logger").into_response();
    };
    ctx.span.record("username", identity.username.as_str());
    ctx.identity = identity;

    next.run(req).await
}

/// Token from the auth cookie, else from `Authorization: Bearer`.
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
