use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{info, warn};

use super::extract::JsonBody;
use crate::app::AppState;
use crate::auth::{issue_token, password::check_credentials};
use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, RequestContext};
use crate::validation::{Rule, Validator};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /api/v1/session - Check credentials and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    jar: CookieJar,
    JsonBody(body): JsonBody<LoginBody>,
) -> Result<(CookieJar, ApiResponse<()>), ApiError> {
    Validator::new(&ctx.translator)
        .field("username", &body.username, &[Rule::Required])
        .field("password", &body.password, &[Rule::Required])
        .finish()?;
    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let stored = state.store.get_user(&username).await?;
    check_credentials(password, stored.map(|u| u.password_hash)).await?;
    info!(event = "USER-AUTHENTICATED", username = %username);

    let security = &state.config.security;
    let token = issue_token(&username, security)?;
    info!(event = "JWT-CREATED", username = %username, expires_in_hours = security.token_expiry_hours);

    Ok((jar.add(session_cookie(security, token)), ApiResponse::created()))
}

/// DELETE /api/v1/session - Expire the session cookie
pub async fn logout(
    State(state): State<AppState>,
    ctx: RequestContext,
    jar: CookieJar,
) -> (CookieJar, ApiResponse<()>) {
    let name = state.config.security.auth_cookie_name.clone();
    if jar.get(&name).is_some() {
        info!(event = "JWT-DELETED", username = ctx.username());
    } else {
        warn!(event = "JWT-ALREADY-DELETED");
    }

    let removal = Cookie::build((name, "")).path("/");
    (jar.remove(removal), ApiResponse::no_content())
}

fn session_cookie(security: &SecurityConfig, token: String) -> Cookie<'static> {
    Cookie::build((security.auth_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(security.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(security.token_expiry_hours))
        .build()
}
