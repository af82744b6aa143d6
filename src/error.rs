// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::authz::PolicyError;
use crate::database::DatabaseError;
use crate::filter::FilterError;

/// Heading placed before the per-field messages of a validation failure.
pub const INVALID_INPUT_HEADING: &str = "There are one or more errors with your input(s):";

/// HTTP API error with status code, machine code and client-facing message.
///
/// Handlers and middleware return these; only the error-catching stage of
/// the pipeline turns one into a response body.
#[derive(Debug, Clone)]
pub enum ApiError {
    // 400 Bad Request
    Validation(Vec<String>),
    InvalidJson,
    InvalidForeignKey,

    // 401 Unauthorized
    Unauthenticated,

    // 403 Forbidden
    Unauthorised,

    // 404 Not Found
    NotFound,

    // 409 Conflict
    UniqueViolation,

    // 500 Internal Server Error
    Internal { trace_id: Uuid, detail: String },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::InvalidJson => 400,
            ApiError::InvalidForeignKey => 400,
            ApiError::Unauthenticated => 401,
            ApiError::Unauthorised => 403,
            ApiError::NotFound => 404,
            ApiError::UniqueViolation => 409,
            ApiError::Internal { .. } => 500,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "INVALID-INPUT-ERROR",
            ApiError::InvalidJson => "INVALID-JSON-ERROR",
            ApiError::InvalidForeignKey => "INVALID-FOREIGN-KEY-ERROR",
            ApiError::Unauthenticated => "USER-UNAUTHENTICATED",
            ApiError::Unauthorised => "USER-UNAUTHORISED",
            ApiError::NotFound => "RESOURCE-NOT-FOUND-ERROR",
            ApiError::UniqueViolation => "UNIQUE-VIOLATION-ERROR",
            ApiError::Internal { .. } => "INTERNAL-SERVER-ERROR",
        }
    }

    /// Get client-safe error message. Internal errors only ever expose their trace id.
    pub fn message(&self) -> String {
        match self {
            ApiError::Validation(messages) => {
                let mut message = INVALID_INPUT_HEADING.to_string();
                for line in messages {
                    message.push('\n');
                    message.push_str(line);
                }
                message
            }
            ApiError::InvalidJson => "Invalid JSON provided as request body".to_string(),
            ApiError::InvalidForeignKey => "The referenced resource does not exist".to_string(),
            ApiError::Unauthenticated => "User unauthenticated".to_string(),
            ApiError::Unauthorised => "User unauthorised".to_string(),
            ApiError::NotFound => "Not found".to_string(),
            ApiError::UniqueViolation => "The resource already exists".to_string(),
            ApiError::Internal { trace_id, .. } => {
                format!("Something went wrong. Trace ID: {}", trace_id)
            }
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "code": self.error_code(),
            "message": self.message(),
        })
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ApiError::Internal { .. })
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(messages: Vec<String>) -> Self {
        ApiError::Validation(messages)
    }

    /// Wrap an unexpected failure, minting a fresh trace id.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        ApiError::Internal {
            trace_id: Uuid::new_v4(),
            detail: detail.to_string(),
        }
    }
}

// Convert other error types to ApiError
impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation(_) => ApiError::UniqueViolation,
            DatabaseError::InvalidForeignKey(_) => ApiError::InvalidForeignKey,
            DatabaseError::NotFound => ApiError::NotFound,
            other => ApiError::internal(other),
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        ApiError::internal(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthenticated,
            other => ApiError::internal(other),
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::Validation(vec![err.to_string()])
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Internal { trace_id, detail } => write!(f, "{} (trace {})", detail, trace_id),
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for ApiError {}

/// Returning an `ApiError` from a handler only sets the status; the error
/// itself rides along in the response extensions for the catcher to render.
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = status.into_response();
        response.extensions_mut().insert(self);
        response
    }
}
