// ABOUTME: Centralized error type for handlers, mutators and storage
// ABOUTME: Maps each failure class onto an HTTP status and a JSON error body

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::validation::ValidationErrors;

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationErrors),
    Precondition(String),
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    Database(sea_orm::DbErr),
    Blob(std::io::Error),
    ExternalService(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors),
            AppError::Precondition(msg) => write!(f, "{}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Database(err) => write!(f, "Database error: {}", err),
            AppError::Blob(err) => write!(f, "File storage error: {}", err),
            AppError::ExternalService(msg) => write!(f, "External service error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Precondition(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_)
            | AppError::Blob(_)
            | AppError::ExternalService(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Validation(errors) => {
                tracing::warn!("Validation failed: {}", errors);
                json!({
                    "error": "Validation failed",
                    "status": status.as_u16(),
                    "violations": errors.violations(),
                })
            }
            AppError::Precondition(msg) | AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                json!({ "error": msg, "status": status.as_u16() })
            }
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                json!({ "error": msg, "status": status.as_u16() })
            }
            AppError::NotFound(msg) => {
                tracing::info!("Resource not found: {}", msg);
                json!({ "error": msg, "status": status.as_u16() })
            }
            AppError::Conflict(msg) => {
                tracing::info!("Conflict: {}", msg);
                json!({ "error": msg, "status": status.as_u16() })
            }
            // Downstream failures are caught once here and passed through with their message
            AppError::Database(_)
            | AppError::Blob(_)
            | AppError::ExternalService(_)
            | AppError::Internal(_) => {
                tracing::error!("{}", self);
                json!({ "error": self.to_string(), "status": status.as_u16() })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Blob(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Serialization error: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
