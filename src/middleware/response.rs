use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::ApiError;

/// Successful handler output: a status and an optional JSON body.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK with a JSON body
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            status_code: StatusCode::OK,
        }
    }
}

impl ApiResponse<()> {
    /// Bare status, no body
    pub fn status(status_code: StatusCode) -> Self {
        Self {
            data: None,
            status_code,
        }
    }

    pub fn ok() -> Self {
        Self::status(StatusCode::OK)
    }

    pub fn created() -> Self {
        Self::status(StatusCode::CREATED)
    }

    pub fn no_content() -> Self {
        Self::status(StatusCode::NO_CONTENT)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let Some(data) = self.data else {
            return self.status_code.into_response();
        };

        match serde_json::to_value(&data) {
            Ok(value) => (self.status_code, Json(value)).into_response(),
            Err(e) => ApiError::internal(format!("Failed to serialize response data: {}", e)).into_response(),
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
