use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::policy::DeveloperRejection;

/// Errors surfaced to HTTP clients as `{error: true, message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Your IP is banned.")]
    Banned,
    #[error("Your IP is now banned for excessive requests.")]
    NewlyBanned,
    #[error("Unauthorized access.")]
    Unauthorized,
    #[error("Invalid 'days' parameter. Use 3, 7, 14, 30, 60, or 90.")]
    InvalidDays,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Banned | ApiError::NewlyBanned | ApiError::Unauthorized => {
                StatusCode::FORBIDDEN
            }
            ApiError::InvalidDays => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DeveloperRejection> for ApiError {
    fn from(r: DeveloperRejection) -> Self {
        match r {
            DeveloperRejection::Unauthorized => ApiError::Unauthorized,
            DeveloperRejection::InvalidDays => ApiError::InvalidDays,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "internal error");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };
        (self.status(), Json(json!({"error": true, "message": message}))).into_response()
    }
}
