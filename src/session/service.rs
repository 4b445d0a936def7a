use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    config::SessionConfig,
    generators::{OsTokenGenerator, TokenGenerator},
    issuer::SessionIssuer,
    models::{CredentialMutation, SessionState},
    password::PasswordHasher,
    repository::CredentialRepository,
    types::{AuthenticatedUser, IssuedSession, RequestCredentials},
};
use crate::shared::AppError;

/// Service for handling registration, login, authorization and logout
pub struct SessionService {
    repository: Arc<dyn CredentialRepository>,
    issuer: SessionIssuer,
    hasher: PasswordHasher,
    config: SessionConfig,
}

impl SessionService {
    pub fn new(
        repository: Arc<dyn CredentialRepository>,
        config: SessionConfig,
    ) -> Result<Self, AppError> {
        Self::with_token_generator(repository, Arc::new(OsTokenGenerator::new()), config)
    }

    pub fn with_token_generator(
        repository: Arc<dyn CredentialRepository>,
        token_generator: Arc<dyn TokenGenerator>,
        config: SessionConfig,
    ) -> Result<Self, AppError> {
        let hasher = PasswordHasher::new(&config.hash_cost, token_generator.clone())?;
        let issuer = SessionIssuer::new(
            repository.clone(),
            token_generator,
            hasher.clone(),
            config.clone(),
        )?;

        Ok(Self {
            repository,
            issuer,
            hasher,
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Creates a credential record; the password hash is fixed from here on
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: String) -> Result<(), AppError> {
        validate(username, &password)?;

        let hashed_password = self.hasher.spawn_hash(password).await?;
        self.repository.create(username, hashed_password).await?;

        info!("User registered");
        Ok(())
    }

    /// Issues a fresh session, silently ending any session the user already had
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: String) -> Result<IssuedSession, AppError> {
        validate(username, &password)?;
        self.issuer.login(username, password).await
    }

    /// Validates a request's session cookie and CSRF header.
    ///
    /// The identity is resolved from the session token itself; a caller
    /// supplied identity is only accepted if it names the session's owner.
    /// Every failure produces the same `Unauthorized` error.
    #[instrument(skip(self, credentials))]
    pub async fn authorize(
        &self,
        credentials: &RequestCredentials,
    ) -> Result<AuthenticatedUser, AppError> {
        let session_token = non_empty(&credentials.session_token)
            .ok_or_else(|| deny("missing session cookie"))?;
        let csrf_token =
            non_empty(&credentials.csrf_token).ok_or_else(|| deny("missing CSRF header"))?;

        let record = self
            .repository
            .find_by_session_token(session_token)
            .await?
            .ok_or_else(|| deny("unknown session token"))?;

        if let Some(claimed) = &credentials.claimed_identity {
            if claimed != &record.identity {
                return Err(deny("claimed identity does not own the session"));
            }
        }

        let session_matches = record
            .session_token
            .as_deref()
            .is_some_and(|stored| constant_time_eq(stored.as_bytes(), session_token.as_bytes()));
        if !session_matches {
            return Err(deny("session token mismatch"));
        }

        let csrf_matches = record
            .csrf_token
            .as_deref()
            .is_some_and(|stored| constant_time_eq(stored.as_bytes(), csrf_token.as_bytes()));
        if !csrf_matches {
            return Err(deny("CSRF token mismatch"));
        }

        let authenticated_at = match record.issued_at {
            Some(issued_at) if !record.is_expired(self.config.session_max_age) => issued_at,
            _ => {
                let clear = CredentialMutation::ClearSession {
                    session_token: session_token.to_string(),
                };
                // Cleanup is best effort; the caller sees the same denial either way
                if let Err(e) = self.repository.update(&record.identity, clear).await {
                    warn!(error = %e, "Failed to clear expired session");
                }
                return Err(deny("session expired"));
            }
        };

        debug!(username = %record.identity, "Request authorized");
        Ok(AuthenticatedUser {
            username: record.identity,
            authenticated_at,
        })
    }

    /// Clears the caller's token pair after authorizing the request
    #[instrument(skip(self, credentials))]
    pub async fn logout(&self, credentials: &RequestCredentials) -> Result<(), AppError> {
        let user = self.authorize(credentials).await?;
        let session_token = credentials
            .session_token
            .clone()
            .ok_or(AppError::Unauthorized)?;

        self.repository
            .update(&user.username, CredentialMutation::ClearSession { session_token })
            .await?;

        info!(username = %user.username, "User logged out");
        Ok(())
    }

    /// Reports whether `username` currently holds a session
    #[instrument(skip(self))]
    pub async fn session_state(&self, username: &str) -> Result<SessionState, AppError> {
        Ok(self.repository.get(username).await?.state())
    }
}

fn validate(username: &str, password: &str) -> Result<(), AppError> {
    if username.is_empty() {
        return Err(AppError::Validation("username is required".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// The reason is logged, never returned
fn deny(reason: &'static str) -> AppError {
    warn!(reason, "Authorization failed");
    AppError::Unauthorized
}

/// Compares a stored token with a presented one without short-circuiting on
/// the first differing byte. Only the length leaks, and tokens have a fixed length.
fn constant_time_eq(stored: &[u8], presented: &[u8]) -> bool {
    stored.len() == presented.len()
        && stored
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (s, p)| acc | (s ^ p))
            == 0
}
