// Library crate for the bookshelf auth server
// This file exposes the public API for integration tests

pub mod session;
pub mod shared;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

// Re-export commonly used types for easier access in tests
pub use session::{
    config::SessionConfig, repository::InMemoryCredentialRepository, service::SessionService,
    AuthenticatedUser, RequestCredentials,
};
pub use shared::{AppError, AppState};

/// Builds the HTTP router; `/whoami` stands in for any protected route
pub fn build_router(app_state: AppState) -> Router {
    let protected = Router::new()
        .route("/whoami", get(session::whoami))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            session::require_session,
        ));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/register", post(session::register))
        .route("/login", post(session::login))
        .route("/logout", post(session::logout))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
