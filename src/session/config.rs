use std::time::Duration;

use super::generators::MIN_TOKEN_BYTES;

/// Cookie lifetime and the matching server-side session lifetime (24 hours)
pub const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24;

/// Upper bound on the session lifetime; browsers cap cookie `Max-Age` at 400 days
pub const MAX_SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 400;

/// Cost parameters for the adaptive password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        // argon2id defaults recommended by OWASP (19 MiB, t=2, p=1)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Runtime configuration for the credential/session subsystem
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub session_max_age: Duration,
    pub token_bytes: usize,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub hash_cost: HashCost,
    pub store_timeout: Duration,
}

impl SessionConfig {
    /// Reads configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let session_max_age = env_parse("SESSION_MAX_AGE_SECS")
            .map(clamp_session_max_age)
            .unwrap_or(defaults.session_max_age);

        // Never hand out tokens shorter than 256 bits, whatever the environment says
        let token_bytes = env_parse::<usize>("SESSION_TOKEN_BYTES")
            .unwrap_or(defaults.token_bytes)
            .max(MIN_TOKEN_BYTES);

        let cookie_domain = std::env::var("COOKIE_DOMAIN")
            .ok()
            .filter(|domain| !domain.trim().is_empty());

        let hash_cost = HashCost {
            memory_kib: env_parse("PASSWORD_HASH_MEMORY_KIB")
                .unwrap_or(defaults.hash_cost.memory_kib),
            iterations: env_parse("PASSWORD_HASH_ITERATIONS")
                .unwrap_or(defaults.hash_cost.iterations),
            parallelism: env_parse("PASSWORD_HASH_PARALLELISM")
                .unwrap_or(defaults.hash_cost.parallelism),
        };

        Self {
            session_max_age,
            token_bytes,
            cookie_domain,
            cookie_secure: env_parse("COOKIE_SECURE").unwrap_or(defaults.cookie_secure),
            hash_cost,
            store_timeout: env_parse("STORE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
        }
    }

    /// Cheap hashing parameters so tests don't spend seconds in argon2
    pub fn for_tests() -> Self {
        Self {
            hash_cost: HashCost {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_max_age: Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECS),
            token_bytes: MIN_TOKEN_BYTES,
            cookie_domain: None,
            cookie_secure: false,
            hash_cost: HashCost::default(),
            store_timeout: Duration::from_millis(2000),
        }
    }
}

fn clamp_session_max_age(secs: u64) -> Duration {
    Duration::from_secs(secs.min(MAX_SESSION_MAX_AGE_SECS))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.trim().parse().ok())
}
