use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    config::SessionConfig,
    generators::TokenGenerator,
    models::CredentialMutation,
    password::{PasswordHasher, SALT_BYTES},
    repository::CredentialRepository,
    types::IssuedSession,
};
use crate::shared::AppError;

/// Plaintext hashed once so that logins for unknown identities cost the same
/// as logins with a wrong password
const TIMING_DECOY_PASSWORD: &str = "timing-decoy-password";
const TIMING_DECOY_SALT: [u8; SALT_BYTES] = *b"bookshelf-decoy!";

/// Orchestrates login: verify credentials, mint a token pair, store it.
///
/// Each successful login replaces the identity's previous token pair, so an
/// identity never has more than one live session.
pub struct SessionIssuer {
    repository: Arc<dyn CredentialRepository>,
    token_generator: Arc<dyn TokenGenerator>,
    hasher: PasswordHasher,
    config: SessionConfig,
    decoy_hash: String,
}

impl SessionIssuer {
    /// Computes the decoy hash up front, so no login pays for building it
    pub fn new(
        repository: Arc<dyn CredentialRepository>,
        token_generator: Arc<dyn TokenGenerator>,
        hasher: PasswordHasher,
        config: SessionConfig,
    ) -> Result<Self, AppError> {
        let decoy_hash = hasher.hash_with_salt(TIMING_DECOY_PASSWORD, &TIMING_DECOY_SALT)?;

        Ok(Self {
            repository,
            token_generator,
            hasher,
            config,
            decoy_hash,
        })
    }

    /// Logs `username` in, invalidating whatever session it held before
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: String) -> Result<IssuedSession, AppError> {
        // Step 1: Check the password against the stored hash
        self.verify_credentials(username, password).await?;

        // Step 2: Mint two independent tokens
        let session_token = self.mint_token()?;
        let csrf_token = self.mint_token()?;

        // Step 3: Overwrite the stored pair in one atomic update
        let issued_at = Utc::now();
        let mutation = CredentialMutation::IssueSession {
            session_token: session_token.clone(),
            csrf_token: csrf_token.clone(),
            issued_at,
        };
        self.repository
            .update(username, mutation)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::InvalidCredentials,
                other => other,
            })?;

        info!(token_length = session_token.len(), "Session issued");

        Ok(IssuedSession {
            identity: username.to_string(),
            session_token,
            csrf_token,
            issued_at,
        })
    }

    /// Unknown identity and wrong password both end in `InvalidCredentials`
    async fn verify_credentials(&self, username: &str, password: String) -> Result<(), AppError> {
        let stored_hash = match self.repository.get(username).await {
            Ok(record) => Some(record.hashed_password),
            Err(AppError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let hash = stored_hash.clone().unwrap_or_else(|| self.decoy_hash.clone());
        let verified = self.hasher.spawn_verify(password, hash).await?;

        if stored_hash.is_none() || !verified {
            warn!(known_identity = stored_hash.is_some(), "Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        Ok(())
    }

    fn mint_token(&self) -> Result<String, AppError> {
        self.token_generator.generate(self.config.token_bytes)
    }
}
