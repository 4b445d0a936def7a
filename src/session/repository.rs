use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::{CredentialMutation, CredentialRecord};
use crate::shared::AppError;

/// Trait for credential store operations
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Inserts a registered record with no session; `AlreadyExists` on duplicates
    async fn create(
        &self,
        identity: &str,
        hashed_password: String,
    ) -> Result<CredentialRecord, AppError>;

    async fn get(&self, identity: &str) -> Result<CredentialRecord, AppError>;

    /// Applies `mutation` atomically with respect to every other `create`/`update`
    async fn update(
        &self,
        identity: &str,
        mutation: CredentialMutation,
    ) -> Result<CredentialRecord, AppError>;

    /// Resolves the record currently holding `session_token`
    async fn find_by_session_token(
        &self,
        session_token: &str,
    ) -> Result<Option<CredentialRecord>, AppError>;
}

#[derive(Default)]
struct CredentialTable {
    records: HashMap<String, CredentialRecord>,
    sessions: HashMap<String, String>, // session_token -> identity
}

/// In-memory credential store.
///
/// Records and the session index sit behind a single lock so every mutation
/// updates both at once. Data is lost when the process restarts.
pub struct InMemoryCredentialRepository {
    table: RwLock<CredentialTable>,
    lock_timeout: Duration,
}

impl Default for InMemoryCredentialRepository {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

impl InMemoryCredentialRepository {
    /// Creates an empty store whose lock waits give up after `lock_timeout`
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            table: RwLock::new(CredentialTable::default()),
            lock_timeout,
        }
    }

    /// Returns the number of registered identities
    pub async fn credential_count(&self) -> Result<usize, AppError> {
        Ok(self.bounded(self.table.read()).await?.records.len())
    }

    /// Returns the number of live sessions in the reverse index
    pub async fn session_count(&self) -> Result<usize, AppError> {
        Ok(self.bounded(self.table.read()).await?.sessions.len())
    }

    async fn bounded<G>(&self, acquire: impl Future<Output = G>) -> Result<G, AppError> {
        tokio::time::timeout(self.lock_timeout, acquire)
            .await
            .map_err(|_| {
                warn!(
                    timeout_ms = self.lock_timeout.as_millis() as u64,
                    "Timed out waiting for credential store lock"
                );
                AppError::StoreTimeout
            })
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    #[instrument(skip(self, hashed_password))]
    async fn create(
        &self,
        identity: &str,
        hashed_password: String,
    ) -> Result<CredentialRecord, AppError> {
        debug!("Creating credential record in memory");

        let mut table = self.bounded(self.table.write()).await?;
        if table.records.contains_key(identity) {
            warn!("Credential record already exists in memory");
            return Err(AppError::AlreadyExists);
        }

        let record = CredentialRecord::new(identity.to_string(), hashed_password);
        table.records.insert(identity.to_string(), record.clone());

        debug!("Credential record created successfully in memory");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn get(&self, identity: &str) -> Result<CredentialRecord, AppError> {
        let table = self.bounded(self.table.read()).await?;
        table.records.get(identity).cloned().ok_or_else(|| {
            debug!("Credential record not found in memory");
            AppError::NotFound("Credential record not found".to_string())
        })
    }

    #[instrument(skip(self, mutation))]
    async fn update(
        &self,
        identity: &str,
        mutation: CredentialMutation,
    ) -> Result<CredentialRecord, AppError> {
        debug!("Updating credential record in memory");

        let mut table = self.bounded(self.table.write()).await?;
        let CredentialTable { records, sessions } = &mut *table;

        let record = records.get_mut(identity).ok_or_else(|| {
            warn!("Credential record not found for update in memory");
            AppError::NotFound("Credential record not found".to_string())
        })?;

        if let Some(retired) = record.apply(mutation) {
            sessions.remove(&retired);
        }
        if let Some(live) = &record.session_token {
            sessions.insert(live.clone(), identity.to_string());
        }

        debug!(state = ?record.state(), "Credential record updated successfully in memory");
        Ok(record.clone())
    }

    #[instrument(skip(self, session_token))]
    async fn find_by_session_token(
        &self,
        session_token: &str,
    ) -> Result<Option<CredentialRecord>, AppError> {
        let table = self.bounded(self.table.read()).await?;
        let record = table
            .sessions
            .get(session_token)
            .and_then(|identity| table.records.get(identity))
            .cloned();

        match &record {
            Some(r) => debug!(identity = %r.identity, "Session token resolved in memory"),
            None => debug!("Session token not present in memory"),
        }

        Ok(record)
    }
}
