//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from permit-core, permit-pack, permit-engine, and
//! permit-state to HTTP status codes, returning JSON bodies with an
//! error code, message, and optional details. Internal error details
//! are never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use permit_core::ResolveError;
use permit_engine::PreCheckError;
use permit_pack::PackError;
use permit_portal::PortalError;
use permit_state::StorageError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested location is outside supported coverage (422).
    #[error("unsupported jurisdiction: {0}")]
    UnsupportedJurisdiction(String),

    /// The case names a permit type its jurisdiction does not offer (422).
    #[error("invalid permit type: {0}")]
    InvalidPermitType(String),

    /// Authentication failure — missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure — insufficient permissions (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// Portal driver failure (502).
    #[error("portal error: {0}")]
    Portal(String),
}

impl AppError {
    /// HTTP status code and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::UnsupportedJurisdiction(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNSUPPORTED_JURISDICTION")
            }
            Self::InvalidPermitType(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_PERMIT_TYPE")
            }
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Portal(_) => (StatusCode::BAD_GATEWAY, "PORTAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Portal(_) => "The jurisdiction portal reported an error".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Portal(_) => tracing::warn!(error = %self, "portal error"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::NotFound { .. } => Self::NotFound(err.to_string()),
            StorageError::Conflict(_) => Self::Conflict(err.to_string()),
        }
    }
}

impl From<PackError> for AppError {
    fn from(err: PackError) -> Self {
        match &err {
            PackError::NotFound { .. } => Self::NotFound(err.to_string()),
            // Corrupt configuration is an operator problem, not caller input.
            PackError::Corrupt { .. } | PackError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        Self::UnsupportedJurisdiction(err.to_string())
    }
}

impl From<PreCheckError> for AppError {
    fn from(err: PreCheckError) -> Self {
        match err {
            PreCheckError::Pack(pack) => pack.into(),
            other @ PreCheckError::InvalidPermitType { .. } => {
                Self::InvalidPermitType(other.to_string())
            }
            PreCheckError::Storage(storage) => storage.into(),
        }
    }
}

impl From<PortalError> for AppError {
    fn from(err: PortalError) -> Self {
        Self::Portal(err.to_string())
    }
}
