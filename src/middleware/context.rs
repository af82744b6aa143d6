use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Span;
use uuid::Uuid;

use crate::error::ApiError;
use crate::i18n::Translator;

/// Who is calling. Anonymous callers have an empty username.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.username.is_empty()
    }
}

/// Shared slot the error-catching stage reads after the rest of the chain returns.
#[derive(Debug, Clone, Default)]
pub struct ErrorSlot(Arc<Mutex<Option<ApiError>>>);

impl ErrorSlot {
    pub fn set(&self, err: ApiError) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
    }

    pub fn take(&self) -> Option<ApiError> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Per-request state threaded through the pipeline in request extensions.
///
/// Each stage fills in its part before calling the next one; handlers get a
/// clone through the extractor below. The error slot is shared between clones.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub span: Span,
    pub translator: Arc<Translator>,
    pub identity: Identity,
    pub errors: ErrorSlot,
}

impl RequestContext {
    pub fn new(request_id: Uuid, span: Span) -> Self {
        Self {
            request_id,
            span,
            translator: Arc::new(Translator::english()),
            identity: Identity::anonymous(),
            errors: ErrorSlot::default(),
        }
    }

    pub fn username(&self) -> &str {
        &self.identity.username
    }

    /// Hand `err` to the error-catching stage and stop here.
    pub fn fail(&self, err: ApiError) -> Response {
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.errors.set(err);
        status.into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| ApiError::internal("request context missing from pipeline"))
    }
}
