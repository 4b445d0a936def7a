use axum::http::{header::COOKIE, HeaderMap};
use cookie::{time::Duration, Cookie, SameSite};

use super::{
    config::SessionConfig,
    types::{CSRF_COOKIE, SESSION_COOKIE},
};

/// Server-only cookie carrying the session token
pub fn session_cookie(token: &str, config: &SessionConfig) -> Cookie<'static> {
    build(SESSION_COOKIE, token.to_string(), true, max_age(config), config)
}

/// Script-readable cookie carrying the CSRF token, to be echoed in `X-CSRF-Token`
pub fn csrf_cookie(token: &str, config: &SessionConfig) -> Cookie<'static> {
    build(CSRF_COOKIE, token.to_string(), false, max_age(config), config)
}

/// Cookies that overwrite and expire both session cookies
pub fn clearing_cookies(config: &SessionConfig) -> [Cookie<'static>; 2] {
    [
        build(SESSION_COOKIE, String::new(), true, Duration::ZERO, config),
        build(CSRF_COOKIE, String::new(), false, Duration::ZERO, config),
    ]
}

fn max_age(config: &SessionConfig) -> Duration {
    Duration::seconds(i64::try_from(config.session_max_age.as_secs()).unwrap_or(i64::MAX))
}

fn build(
    name: &'static str,
    value: String,
    http_only: bool,
    max_age: Duration,
    config: &SessionConfig,
) -> Cookie<'static> {
    let mut builder = Cookie::build((name, value))
        .path("/")
        .http_only(http_only)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(max_age);

    if let Some(domain) = &config.cookie_domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

/// Finds the first non-empty cookie called `name` across all `Cookie` headers
pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}
