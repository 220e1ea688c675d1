//! Error types for Keygate
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Session decode failures never reach this type as a response: the
/// session store degrades them to an empty session. `SessionStore` only
/// surfaces when a session cannot be written.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// Authentication required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Access denied (403)
    #[error("Access denied")]
    Forbidden,

    /// OAuth state parameter did not match the pending login (403)
    #[error("Invalid state parameter")]
    StateMismatch,

    /// Authorization code could not be exchanged (500)
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// Entropy source unavailable (500)
    #[error("Randomness failure: {0}")]
    Randomness(String),

    /// Session could not be encoded or signed (500)
    #[error("Session store error: {0}")]
    SessionStore(String),

    /// Request body binding failed (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::StateMismatch => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::TokenExchange(_)
            | AppError::Randomness(_)
            | AppError::SessionStore(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body. Upstream details are logged, not returned.
    fn into_response(self) -> Response {
        use axum::Json;

        let (error_message, error_type) = match &self {
            AppError::NotFound => (self.to_string(), "not_found"),
            AppError::Unauthorized => (self.to_string(), "unauthorized"),
            AppError::Forbidden => (self.to_string(), "forbidden"),
            AppError::StateMismatch => (self.to_string(), "state_mismatch"),
            AppError::Validation(msg) => (msg.clone(), "validation"),
            AppError::TokenExchange(_) => {
                ("Token exchange failed".to_string(), "token_exchange")
            }
            AppError::Randomness(_) => ("Internal server error".to_string(), "randomness"),
            AppError::SessionStore(_) => ("Internal server error".to_string(), "session_store"),
            AppError::Config(_) => ("Internal server error".to_string(), "config"),
            AppError::Internal(_) => ("Internal server error".to_string(), "internal"),
        };

        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
