use axum::Router;
use std::sync::Arc;

use bookshelf_auth::{
    build_router, AppState, InMemoryCredentialRepository, SessionConfig, SessionService,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub app: Router,
    pub repository: Arc<InMemoryCredentialRepository>,
    pub service: Arc<SessionService>,
}

pub struct TestSetupBuilder {
    users: Vec<(String, String)>,
    config: SessionConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            users: vec![],
            config: SessionConfig::for_tests(),
        }
    }

    /// Pre-register a user through the service before the router is built
    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.users.push((username.to_string(), password.to_string()));
        self
    }

    pub fn with_alice(self) -> Self {
        self.with_user("alice", "hunter2")
    }

    pub fn with_alice_and_bob(self) -> Self {
        self.with_alice().with_user("bob", "swordfish")
    }

    #[allow(dead_code)]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build(self) -> TestSetup {
        let repository = Arc::new(InMemoryCredentialRepository::new(self.config.store_timeout));
        let service = Arc::new(SessionService::new(repository.clone(), self.config).unwrap());

        for (username, password) in self.users {
            service.register(&username, password).await.unwrap();
        }

        TestSetup {
            app: build_router(AppState::new(service.clone())),
            repository,
            service,
        }
    }
}
