use axum::{
    extract::{rejection::FormRejection, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Extension, Form, Json,
};
use tracing::{info, instrument, warn};

use super::{
    cookies::{clearing_cookies, csrf_cookie, session_cookie},
    types::{
        AuthenticatedUser, CredentialsForm, LoginResponse, LogoutForm, MessageResponse,
        RequestCredentials, WhoAmIResponse,
    },
};
use crate::shared::{AppError, AppState};

/// HTTP handler for registering a new user
///
/// POST /register (form: username, password)
#[instrument(name = "register", skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let (username, password) = parse_credentials(form)?;

    state
        .session_service
        .register(&username, password)
        .await?;

    info!(username = %username, "Registration completed");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// HTTP handler for logging in
///
/// POST /login (form: username, password)
/// Sets an HTTP-only `session_token` cookie and a script-readable `csrf_token` cookie
#[instrument(name = "login", skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (username, password) = parse_credentials(form)?;

    let service = &state.session_service;
    let issued = service.login(&username, password).await?;

    let config = service.config();
    let cookies = AppendHeaders([
        (SET_COOKIE, session_cookie(&issued.session_token, config).to_string()),
        (SET_COOKIE, csrf_cookie(&issued.csrf_token, config).to_string()),
    ]);

    info!(username = %issued.identity, "Login completed");
    Ok((
        cookies,
        Json(LoginResponse {
            username: issued.identity,
        }),
    ))
}

/// HTTP handler for logging out
///
/// POST /logout (cookies + X-CSRF-Token header, optional form field username)
#[instrument(name = "logout", skip(state, headers, form))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<LogoutForm>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let claimed_identity = form.ok().and_then(|Form(form)| form.username);
    let credentials = RequestCredentials::from_headers(&headers, claimed_identity);

    let service = &state.session_service;
    service.logout(&credentials).await?;

    let [clear_session, clear_csrf] = clearing_cookies(service.config());
    Ok((
        AppendHeaders([
            (SET_COOKIE, clear_session.to_string()),
            (SET_COOKIE, clear_csrf.to_string()),
        ]),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// Protected handler returning the identity bound to the caller's session
///
/// GET /whoami (behind `require_session`)
#[instrument(name = "whoami", skip(state, user))]
pub async fn whoami(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<WhoAmIResponse>, AppError> {
    let session_state = state.session_service.session_state(&user.username).await?;

    Ok(Json(WhoAmIResponse {
        username: user.username,
        state: session_state,
        authenticated_at: user.authenticated_at,
    }))
}

fn parse_credentials(
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<(String, String), AppError> {
    let Form(form) = form.map_err(|rejection| {
        warn!(error = %rejection, "Rejected malformed credentials form");
        AppError::Validation("username and password are required".to_string())
    })?;
    form.into_parts()
}
