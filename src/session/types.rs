use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::SessionState;
use crate::shared::AppError;

pub const SESSION_COOKIE: &str = "session_token";
pub const CSRF_COOKIE: &str = "csrf_token";
/// `X-CSRF-Token`, lowercased for `HeaderMap` lookups
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Form body for register and login
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsForm {
    /// Returns `(username, password)`, rejecting missing or blank fields
    pub fn into_parts(self) -> Result<(String, String), AppError> {
        let username = required(self.username, "username")?;
        let password = required(self.password, "password")?;
        Ok((username, password))
    }
}

/// Form body accepted by logout; the username is optional
#[derive(Debug, Default, Deserialize)]
pub struct LogoutForm {
    pub username: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}

/// Token pair minted by a successful login
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub identity: String,
    pub session_token: String,
    pub csrf_token: String,
    pub issued_at: DateTime<Utc>,
}

/// Identity resolved from a valid session, inserted into request extensions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatedUser {
    pub username: String,
    pub authenticated_at: DateTime<Utc>,
}

/// Credentials presented by an incoming request
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    /// Identity asserted by the caller; only checked against the session's owner
    pub claimed_identity: Option<String>,
    pub session_token: Option<String>,
    pub csrf_token: Option<String>,
}

impl RequestCredentials {
    /// Extracts the session cookie and CSRF header from request headers
    pub fn from_headers(headers: &HeaderMap, claimed_identity: Option<String>) -> Self {
        let session_token = super::cookies::find_cookie(headers, SESSION_COOKIE);
        let csrf_token = headers
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Self {
            claimed_identity: claimed_identity.filter(|identity| !identity.is_empty()),
            session_token,
            csrf_token,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WhoAmIResponse {
    pub username: String,
    pub state: SessionState,
    pub authenticated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    #[rstest]
    #[case(None, Some("pw"), "username is required")]
    #[case(Some(""), Some("pw"), "username is required")]
    #[case(Some("alice"), None, "password is required")]
    #[case(Some("alice"), Some(""), "password is required")]
    fn test_missing_fields_rejected(
        #[case] username: Option<&str>,
        #[case] password: Option<&str>,
        #[case] expected: &str,
    ) {
        let form = CredentialsForm {
            username: username.map(str::to_string),
            password: password.map(str::to_string),
        };

        match form.into_parts() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, expected),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_request_credentials_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; session_token=abc; csrf_token=def"),
        );
        headers.insert(CSRF_HEADER, HeaderValue::from_static("def"));

        let creds = RequestCredentials::from_headers(&headers, Some("alice".to_string()));
        assert_eq!(creds.session_token.as_deref(), Some("abc"));
        assert_eq!(creds.csrf_token.as_deref(), Some("def"));
        assert_eq!(creds.claimed_identity.as_deref(), Some("alice"));
    }

    #[test]
    fn test_request_credentials_empty() {
        let creds = RequestCredentials::from_headers(&HeaderMap::new(), Some(String::new()));
        assert!(creds.session_token.is_none());
        assert!(creds.csrf_token.is_none());
        assert!(creds.claimed_identity.is_none());
    }
}
