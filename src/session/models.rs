use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One stored credential per identity
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub identity: String,
    pub hashed_password: String, // PHC string, never rewritten after creation
    pub session_token: Option<String>,
    pub csrf_token: Option<String>,
    pub issued_at: Option<DateTime<Utc>>, // When the current token pair was minted
}

impl CredentialRecord {
    /// Creates a registered record without any session
    pub fn new(identity: String, hashed_password: String) -> Self {
        Self {
            identity,
            hashed_password,
            session_token: None,
            csrf_token: None,
            issued_at: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.session_token, &self.csrf_token) {
            (Some(_), Some(_)) => SessionState::Authenticated,
            _ => SessionState::Registered,
        }
    }

    /// True when the current token pair is older than `max_age`.
    /// A lifetime reaching past the representable calendar never expires.
    pub fn is_expired(&self, max_age: Duration) -> bool {
        let Some(issued_at) = self.issued_at else {
            return true;
        };
        chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|max_age| issued_at.checked_add_signed(max_age))
            .is_some_and(|expires_at| Utc::now() > expires_at)
    }

    /// Applies a mutation in place, keeping the token pair all-set or all-clear.
    /// Returns the session token that stopped being valid, if any.
    pub(crate) fn apply(&mut self, mutation: CredentialMutation) -> Option<String> {
        match mutation {
            CredentialMutation::IssueSession {
                session_token,
                csrf_token,
                issued_at,
            } => {
                let replaced = self.session_token.replace(session_token);
                self.csrf_token = Some(csrf_token);
                self.issued_at = Some(issued_at);
                replaced
            }
            CredentialMutation::ClearSession { session_token } => {
                if self.session_token.as_deref() != Some(session_token.as_str()) {
                    // A newer login already replaced this session
                    return None;
                }
                self.csrf_token = None;
                self.issued_at = None;
                self.session_token.take()
            }
        }
    }
}

/// Atomic changes the store can apply to an existing record
#[derive(Debug, Clone)]
pub enum CredentialMutation {
    /// Install a fresh token pair, silently replacing any previous session
    IssueSession {
        session_token: String,
        csrf_token: String,
        issued_at: DateTime<Utc>,
    },
    /// Clear the token pair, but only while `session_token` is still the live one
    ClearSession { session_token: String },
}

/// Per-identity lifecycle (anonymous identities have no record at all)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Registered,
    Authenticated,
}
