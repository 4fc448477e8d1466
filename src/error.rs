//! Domain error types for the gateway.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Secret store fetch failed; authorization must deny, never allow
    #[error("Secret store error: {0}")]
    SecretStore(String),

    /// Caller failed the authorization check
    #[error("Unauthorized")]
    Unauthorized,

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Downstream proxy call failed
    #[error("Proxy error: {0}")]
    Proxy(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            // 401 carries no body: nothing about which tier was checked or
            // why may leak to an unauthenticated caller.
            AppError::Unauthorized => {
                HttpResponse::build(actix_web::http::StatusCode::UNAUTHORIZED).finish()
            }
            AppError::SecretStore(err_str) => {
                tracing::error!("Secret store error: {}", err_str);
                HttpResponse::build(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR).json(
                    ErrorResponse {
                        error: "SECRET_STORE_ERROR".to_string(),
                        message: "An internal error occurred".to_string(),
                    },
                )
            }
            AppError::InvalidInput(_) => {
                HttpResponse::build(actix_web::http::StatusCode::BAD_REQUEST).json(ErrorResponse {
                    error: "INVALID_INPUT".to_string(),
                    message: self.to_string(),
                })
            }
            AppError::Proxy(err_str) => {
                tracing::error!("Proxy error: {}", err_str);
                HttpResponse::build(actix_web::http::StatusCode::BAD_GATEWAY).json(ErrorResponse {
                    error: "PROXY_ERROR".to_string(),
                    message: "Downstream call failed".to_string(),
                })
            }
        }
    }
}

/// Error response body for non-401 failures.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<crate::secrets::SecretStoreError> for AppError {
    fn from(err: crate::secrets::SecretStoreError) -> Self {
        AppError::SecretStore(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_unauthorized_has_empty_body() {
        let resp = AppError::Unauthorized.error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        // The rejection must not describe which tier was checked.
        assert!(resp.headers().get("content-type").is_none());
    }

    #[test]
    fn test_secret_store_error_is_server_error() {
        let resp = AppError::SecretStore("disk".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
