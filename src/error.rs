use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::catalog::CatalogError;
use crate::estimator::EstimateError;

/// HTTP-facing error types
#[derive(Debug)]
pub enum AppError {
    /// Catalog tables could not be fetched
    CatalogLoad(String),
    /// Catalog fetched but a required section is empty
    CatalogIncomplete(String),
    /// A stepper validation failure, with its localized message
    Validation { message: String, kind: &'static str },
    /// Bad request payload
    BadRequest(String),
    /// Unknown or expired session
    SessionNotFound(String),
    /// Session exists but its catalog is not ready
    SessionNotReady(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CatalogLoad(msg) => write!(f, "Catalog load error: {}", msg),
            Self::CatalogIncomplete(msg) => write!(f, "Catalog incomplete: {}", msg),
            Self::Validation { message, .. } => write!(f, "Validation error: {}", message),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::SessionNotFound(id) => write!(f, "Session not found: {}", id),
            Self::SessionNotReady(msg) => write!(f, "Session not ready: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::CatalogLoad(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            Self::CatalogIncomplete(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            Self::Validation { message, .. } => (StatusCode::UNPROCESSABLE_ENTITY, message.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::SessionNotFound(id) => (StatusCode::NOT_FOUND, format!("session {} not found", id)),
            Self::SessionNotReady(msg) => (StatusCode::CONFLICT, msg.clone()),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type_name(&self),
            }
        }));

        (status, body).into_response()
    }
}

fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::CatalogLoad(_) => "catalog_load_error",
        AppError::CatalogIncomplete(_) => "catalog_incomplete",
        AppError::Validation { kind, .. } => kind,
        AppError::BadRequest(_) => "bad_request",
        AppError::SessionNotFound(_) => "session_not_found",
        AppError::SessionNotReady(_) => "session_not_ready",
    }
}

/// Stable type tag for a validation failure
pub fn validation_kind(error: &EstimateError) -> &'static str {
    match error {
        EstimateError::MissingSelections { .. } => "missing_selections",
        EstimateError::InvalidSelection { .. } => "invalid_selection",
        EstimateError::ResultShown => "result_shown",
        EstimateError::NoEstimate => "no_estimate",
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Load(_) | CatalogError::Cancelled | CatalogError::Database(_) => {
                Self::CatalogLoad(err.to_string())
            }
            CatalogError::Incomplete { .. } => Self::CatalogIncomplete(err.to_string()),
            CatalogError::Invalid(_) | CatalogError::Parse(_) => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<EstimateError> for AppError {
    fn from(err: EstimateError) -> Self {
        Self::Validation {
            kind: validation_kind(&err),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
