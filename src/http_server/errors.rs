//! API error envelope
//!
//! Every failed request answers with
//! `{"code": <status>, "error": "<message>", "violations": [...]?}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::record::RecordError;
use crate::schema::Violation;

/// Errors surfaced by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Unparseable body or path parameter
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Record(e) => e.status_code(),
            ApiError::Auth(e) => e.status_code(),
            ApiError::BadRequest(_) => 400,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        let violations = match err {
            ApiError::Record(e) => e.violations().map(|v| v.as_slice().to_vec()),
            _ => None,
        };
        Self {
            code: err.status_code(),
            error: err.to_string(),
            violations,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::from(&self);
        let status =
            StatusCode::from_u16(body.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(status = body.code, error = %body.error, "request failed");
        } else {
            warn!(status = body.code, error = %body.error, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}
