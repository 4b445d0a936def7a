use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use super::setup::TestSetup;

/// Cookie pair handed out by a successful login
#[derive(Debug, Clone)]
pub struct SessionCookies {
    pub session_token: String,
    pub csrf_token: String,
}

/// Decoded response: status, `Set-Cookie` headers and JSON body
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<String>,
    pub body: Value,
}

impl TestResponse {
    async fn from_response(response: Response<Body>) -> Self {
        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Self {
            status,
            set_cookies,
            body,
        }
    }

    /// Extracts the `session_token`/`csrf_token` values from `Set-Cookie`
    pub fn session_cookies(&self) -> SessionCookies {
        SessionCookies {
            session_token: self.cookie_value("session_token").unwrap(),
            csrf_token: self.cookie_value("csrf_token").unwrap(),
        }
    }

    pub fn cookie_value(&self, name: &str) -> Option<String> {
        self.set_cookies.iter().find_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }

    pub fn cookie_header(&self, name: &str) -> Option<&str> {
        self.set_cookies
            .iter()
            .find(|cookie| cookie.starts_with(&format!("{name}=")))
            .map(String::as_str)
    }
}

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        TestResponse::from_response(response).await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn register(&self, username: &str, password: &str) -> TestResponse {
        self.post_form("/register", &format!("username={username}&password={password}"))
            .await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post_form("/login", &format!("username={username}&password={password}"))
            .await
    }

    /// Logs in and returns the issued cookies, panicking on failure
    pub async fn login_ok(&self, username: &str, password: &str) -> SessionCookies {
        let response = self.login(username, password).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {:?}", response.body);
        response.session_cookies()
    }

    /// GET /whoami with optional session cookie and CSRF header
    pub async fn whoami(&self, session_token: Option<&str>, csrf_token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri("/whoami");
        if let Some(token) = session_token {
            builder = builder.header(header::COOKIE, format!("session_token={token}"));
        }
        if let Some(token) = csrf_token {
            builder = builder.header("X-CSRF-Token", token);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn whoami_with(&self, cookies: &SessionCookies) -> TestResponse {
        self.whoami(Some(&cookies.session_token), Some(&cookies.csrf_token))
            .await
    }

    /// POST /logout with the given cookies and an optional claimed username
    pub async fn logout(&self, cookies: &SessionCookies, username: Option<&str>) -> TestResponse {
        let body = username
            .map(|name| format!("username={name}"))
            .unwrap_or_default();
        let request = Request::builder()
            .method("POST")
            .uri("/logout")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(
                header::COOKIE,
                format!(
                    "session_token={}; csrf_token={}",
                    cookies.session_token, cookies.csrf_token
                ),
            )
            .header("X-CSRF-Token", cookies.csrf_token.as_str())
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}
