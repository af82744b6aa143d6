use axum::extract::{Path, State};
use serde::Deserialize;
use tracing::info;

use super::extract::JsonBody;
use crate::app::AppState;
use crate::auth::password::hash_password_blocking;
use crate::database::models::NewUser;
use crate::middleware::{response::ApiResult, ApiResponse, RequestContext};
use crate::validation::{Rule, Validator, PASSWORD_MIN_LEN};

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    pub password: Option<String>,
}

/// POST /api/v1/users/{username} - Register an account and grant the default user rules
pub async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(username): Path<String>,
    JsonBody(body): JsonBody<CreateUserBody>,
) -> ApiResult<()> {
    Validator::new(&ctx.translator)
        .field("username", &username, &[Rule::Required, Rule::NotBlank, Rule::Username])
        .field(
            "password",
            &body.password,
            &[Rule::Required, Rule::NotBlank, Rule::MinLen(PASSWORD_MIN_LEN), Rule::Password],
        )
        .finish()?;

    let password_hash = hash_password_blocking(body.password.unwrap_or_default()).await?;
    state
        .store
        .create_user(NewUser {
            username: username.clone(),
            password_hash,
        })
        .await?;
    state.policies.grant_user_defaults(&username).await?;

    info!(event = "USER-CREATED", username = %username);
    Ok(ApiResponse::created())
}
