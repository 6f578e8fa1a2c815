//! Typed API failures and their JSON envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::error;

use crate::orders::OrderError;

/// Everything a handler can fail with. `IntoResponse` renders the uniform
/// `{ "success": false, "error": ..., "errors"?: ... }` envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Validation error")]
    Validation(BTreeMap<String, String>),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Admin access required")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("Server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal details stay in the log, never in the response body.
        if let ApiError::Internal(ref e) = self {
            error!("internal error: {e:#}");
        }

        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => json!({
                "success": false,
                "error": "Validation error",
                "errors": errors,
            }),
            other => json!({
                "success": false,
                "error": other.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound => ApiError::NotFound(e.to_string()),
            OrderError::Db(e) => ApiError::Internal(e.into()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}
