use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::session::service::SessionService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<SessionService>,
}

impl AppState {
    pub fn new(session_service: Arc<SessionService>) -> Self {
        Self { session_service }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Username already exists")]
    AlreadyExists,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Entropy source failure: {0}")]
    Entropy(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Credential store timed out")]
    StoreTimeout,

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Entropy failures must never be retried or papered over with a weaker source.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Entropy(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreTimeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Entropy(_) | AppError::PasswordHash(_) | AppError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::Entropy(detail) | AppError::PasswordHash(detail) => {
                error!(error = %detail, fatal = self.is_fatal(), "Request aborted");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Validation("username is required".to_string()), StatusCode::BAD_REQUEST)]
    #[case(AppError::AlreadyExists, StatusCode::CONFLICT)]
    #[case(AppError::InvalidCredentials, StatusCode::UNAUTHORIZED)]
    #[case(AppError::Unauthorized, StatusCode::UNAUTHORIZED)]
    #[case(AppError::StoreTimeout, StatusCode::SERVICE_UNAVAILABLE)]
    #[case(AppError::Entropy("os rng unavailable".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_codes(#[case] error: AppError, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
        assert_eq!(error.into_response().status(), expected);
    }

    #[test]
    fn test_only_entropy_errors_are_fatal() {
        assert!(AppError::Entropy("boom".to_string()).is_fatal());
        assert!(!AppError::PasswordHash("bad params".to_string()).is_fatal());
        assert!(!AppError::Unauthorized.is_fatal());
    }

    #[tokio::test]
    async fn test_internal_details_are_not_exposed() {
        let response = AppError::Entropy("getrandom returned EIO".to_string()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(body["error"], "Internal server error");
    }
}
