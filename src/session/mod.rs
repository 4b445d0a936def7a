// Public API - what other modules can use
pub use handlers::{login, logout, register, whoami};
pub use middleware::require_session;
pub use types::{AuthenticatedUser, IssuedSession, RequestCredentials};

// Internal modules
pub mod config;
pub mod cookies;
pub mod generators;
mod handlers;
pub mod issuer;
mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod types;
