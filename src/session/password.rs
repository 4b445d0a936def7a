//! Password hashing and verification (argon2id, PHC string format).
use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::{config::HashCost, generators::TokenGenerator};
use crate::shared::AppError;

/// Salt length in bytes
pub const SALT_BYTES: usize = 16;

/// Adaptive one-way password hasher.
///
/// The produced blob embeds algorithm, version, cost parameters and salt, so
/// [`PasswordHasher::verify`] needs nothing but the blob itself.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    salt_source: Arc<dyn TokenGenerator>,
}

impl PasswordHasher {
    /// Salts are drawn from `salt_source`, the same source that mints tokens
    pub fn new(cost: &HashCost, salt_source: Arc<dyn TokenGenerator>) -> Result<Self, AppError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| AppError::PasswordHash(e.to_string()))?;
        Ok(Self {
            params,
            salt_source,
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes `plain` with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<String, AppError> {
        let mut salt_bytes = [0u8; SALT_BYTES];
        self.salt_source.fill(&mut salt_bytes)?;
        self.hash_with_salt(plain, &salt_bytes)
    }

    /// Hashes `plain` with a caller-chosen salt, at the configured cost.
    /// Only meant for blobs that never guard a real credential.
    pub fn hash_with_salt(&self, plain: &str, salt_bytes: &[u8]) -> Result<String, AppError> {
        let salt = SaltString::encode_b64(salt_bytes)
            .map_err(|e| AppError::PasswordHash(e.to_string()))?;

        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| AppError::PasswordHash(e.to_string()))?
            .to_string();

        debug!(
            m_cost = self.params.m_cost(),
            t_cost = self.params.t_cost(),
            "Password hashed"
        );
        Ok(hash)
    }

    /// Verifies `plain` against a stored blob; malformed blobs never verify
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        // Cost and salt come from the blob, not from self.params
        self.argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// [`Self::hash`] on the blocking pool, keeping argon2 off the async workers
    pub async fn spawn_hash(&self, plain: String) -> Result<String, AppError> {
        let hasher = self.clone();
        run_blocking(move || hasher.hash(&plain)).await?
    }

    /// [`Self::verify`] on the blocking pool
    pub async fn spawn_verify(&self, plain: String, hash: String) -> Result<bool, AppError> {
        let hasher = self.clone();
        run_blocking(move || hasher.verify(&plain, &hash)).await
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|e| {
        error!(error = %e, "Password hashing task failed");
        AppError::Internal
    })
}
