//! Error types for the HTTP layer

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{credentials::CredentialError, repositories::StoreError};

/// Custom error type for the HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Rejected login attempt
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// Missing or invalid session
    #[error("No autenticado")]
    Unauthorized,

    /// Authenticated but not allowed
    #[error("Acceso denegado")]
    Forbidden,

    /// Bad request with message
    #[error("{0}")]
    BadRequest(String),

    #[error("Recurso no encontrado")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    /// Persistence failure
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(username) => {
                ApiError::Conflict(format!("El usuario {} ya existe", username))
            }
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Credentials(CredentialError::Store(e)) | ApiError::Store(e) => {
                error!("User store failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno del servidor".to_string(),
                )
            }
            ApiError::Credentials(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "No autenticado".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Acceso denegado".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Recurso no encontrado".to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno del servidor".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for handler results
pub type ApiResult<T> = Result<T, ApiError>;
