use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::filter::{ListQuery, SortBy};
use crate::middleware::RequestContext;
use crate::validation::{Rule, Validator};

/// JSON request body. Any decoding failure, a missing content type included,
/// becomes `INVALID-JSON-ERROR`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(_) => Err(ApiError::InvalidJson),
        }
    }
}

/// Parse and check the caller-controlled part of a list request.
pub fn list_options(ctx: &RequestContext, raw: Option<&str>) -> Result<(ListQuery, SortBy), ApiError> {
    let list = ListQuery::parse(raw);

    Validator::new(&ctx.translator)
        .field("query", &list.query, &[Rule::OmitEmpty, Rule::NotBlank])
        .field("sort by", &list.sort_by, &[Rule::OmitEmpty, Rule::OneOf(&SortBy::ALL)])
        .finish()?;

    let sort_by = match list.sort_by.as_deref() {
        Some(s) if !s.is_empty() => s.parse::<SortBy>()?,
        _ => SortBy::default(),
    };
    Ok((list, sort_by))
}

/// Reject anything that is not a canonical version-4 UUID.
pub fn check_id(ctx: &RequestContext, name: &str, id: &str) -> Result<(), ApiError> {
    Validator::new(&ctx.translator)
        .field(name, id, &[Rule::Required, Rule::NotBlank, Rule::Uuid4])
        .finish()
}
