use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{info, instrument, warn};

use super::types::RequestCredentials;
use crate::shared::{AppError, AppState};

/// Session authentication middleware - checks the `session_token` cookie and the
/// `X-CSRF-Token` header and adds `AuthenticatedUser` to the request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), session::require_session))
/// Handlers can then extract Extension(user): Extension<AuthenticatedUser>.
#[instrument(skip(state, req, next))]
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = RequestCredentials::from_headers(req.headers(), None);

    let user = match state.session_service.authorize(&credentials).await {
        Ok(user) => user,
        Err(e) => {
            warn!(uri = %req.uri(), "Session authentication failed: {}", e);
            return Err(e);
        }
    };

    info!(username = %user.username, "Authentication successful, adding user to request");

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
