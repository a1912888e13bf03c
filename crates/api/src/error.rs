//! API error types
//!
//! Every failure is answered with a `{"error": message}` body. Status codes:
//! 400 bad input, 401 authentication, 404 ownership (never 403), 500 downstream.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use franklin_billing::BillingError;
use serde_json::json;

use crate::auth::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("customer_id is required")]
    MissingCustomerId,

    #[error("Failed to authenticate user")]
    Unauthorized(#[from] AuthError),

    #[error("Customer not found or access denied")]
    CustomerNotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingCustomerId => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::CustomerNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::CustomerNotFound => ApiError::CustomerNotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(message) => {
                tracing::error!(status = %status, error = %message, "Request failed")
            }
            ApiError::Unauthorized(cause) => {
                tracing::warn!(status = %status, cause = %cause, "Authentication failed")
            }
            _ => tracing::warn!(status = %status, error = %self, "Request rejected"),
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
