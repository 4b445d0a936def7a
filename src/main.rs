use bookshelf_auth::{
    build_router, AppState, InMemoryCredentialRepository, SessionConfig, SessionService,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env before anything reads the environment
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshelf_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bookshelf auth server");

    let config = SessionConfig::from_env();
    let credential_repository = Arc::new(InMemoryCredentialRepository::new(config.store_timeout));

    let session_service = match SessionService::new(credential_repository, config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!(error = %e, "Invalid session configuration");
            std::process::exit(1);
        }
    };

    let app = build_router(AppState::new(session_service));

    let port = std::env::var("SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, port = %port, "Failed to bind listener");
            std::process::exit(1);
        }
    };
    info!("Server running on http://localhost:{}", port);

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
    }
}
