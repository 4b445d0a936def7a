use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, TryRngCore};
use tracing::error;

use crate::shared::AppError;

/// Minimum token size in bytes (32 bytes = 256 bits of entropy)
pub const MIN_TOKEN_BYTES: usize = 32;

/// Source of randomness for session tokens, CSRF tokens and password salts
pub trait TokenGenerator: Send + Sync {
    /// Fills `buffer` with cryptographically secure random bytes.
    ///
    /// A failed read is the fatal [`AppError::Entropy`]; there is no fallback.
    fn fill(&self, buffer: &mut [u8]) -> Result<(), AppError>;

    /// Returns `byte_length` random bytes encoded as unpadded URL-safe base64.
    fn generate(&self, byte_length: usize) -> Result<String, AppError> {
        let mut buffer = vec![0u8; byte_length];
        self.fill(&mut buffer)?;
        Ok(URL_SAFE_NO_PAD.encode(buffer))
    }
}

/// Token generator backed by the operating system CSPRNG
pub struct OsTokenGenerator;

impl OsTokenGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OsTokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenGenerator for OsTokenGenerator {
    fn fill(&self, buffer: &mut [u8]) -> Result<(), AppError> {
        OsRng.try_fill_bytes(buffer).map_err(|e| {
            error!(error = %e, "Failed to read from OS entropy source");
            AppError::Entropy(e.to_string())
        })
    }
}

/// Length of the unpadded base64 encoding of `byte_length` bytes
pub fn encoded_len(byte_length: usize) -> usize {
    (byte_length * 4).div_ceil(3)
}
