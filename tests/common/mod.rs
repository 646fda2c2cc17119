#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use enterprize::{
    auth::Role, config::Settings, models::UserCreate, repositories::Repositories,
    routes::create_router, AppState,
};
use serde_json::Value;
use std::collections::HashMap;
use tower::ServiceExt;

pub const API_KEY: &str = "test-api-key";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const USER_EMAIL: &str = "analyst@example.com";
pub const PASSWORD: &str = "correct horse battery";

const AUTH_SECRET: &str =
    "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

/// Settings for router tests; `overrides` replace the defaults below
pub fn test_settings(overrides: &[(&str, &str)]) -> Settings {
    let mut env: HashMap<String, String> = [
        ("API_KEYS", API_KEY),
        ("AUTH_SECRET", AUTH_SECRET),
        ("LOG_LEVEL", "error"),
        ("RATE_LIMIT_ENABLED", "false"),
        ("PUBLIC_BASE_URL", "http://dashboard.test"),
        ("BURP_TIMEOUT_SECONDS", "2"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        env.insert(k.to_string(), v.to_string());
    }
    Settings::from_lookup(|key| env.get(key).cloned()).expect("valid test settings")
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Application over in-memory repositories with one admin and one user
    pub async fn new() -> Self {
        Self::with_settings(test_settings(&[])).await
    }

    pub async fn with_settings(settings: Settings) -> Self {
        let state = AppState::from_repositories(settings, Repositories::in_memory(), None)
            .expect("app state");

        for (email, role) in [(ADMIN_EMAIL, Role::Admin), (USER_EMAIL, Role::User)] {
            state
                .auth_service
                .create_user(UserCreate {
                    email: email.to_string(),
                    name: email.split('@').next().unwrap_or(email).to_string(),
                    password: PASSWORD.to_string(),
                    role: Some(role),
                })
                .await
                .expect("seed user");
        }

        let router = create_router(state.clone());
        Self { router, state }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// JSON request authenticated with the API key
    pub async fn api(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.send(json_request(method, uri, body, Some(("x-api-key", API_KEY))))
            .await
    }

    /// JSON request carrying a session cookie
    pub async fn api_with_cookie(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: &str,
    ) -> Response {
        self.send(json_request(method, uri, body, Some(("cookie", cookie))))
            .await
    }

    /// Log in through the JSON API and return the `Cookie` header value
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .send(json_request(
                Method::POST,
                "/api/auth/login",
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie(&response).expect("session cookie")
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    body: Option<Value>,
    header: Option<(&str, &str)>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((name, value)) = header {
        builder = builder.header(name, value);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn page_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// `name=value` part of the session `Set-Cookie` header
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Helper function to extract response body
pub async fn extract_body(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn extract_json(response: Response) -> Value {
    serde_json::from_slice(&extract_body(response).await).unwrap()
}

pub async fn extract_text(response: Response) -> String {
    String::from_utf8(extract_body(response).await).unwrap()
}

/// Percent-encode a form value
pub fn form_encode(value: &str) -> String {
    let mut out = String::new();
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
