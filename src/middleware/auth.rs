use crate::auth::{UserContext, UserSession, SESSION_COOKIE};
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;

/// Resolve the caller from an API key header or the session cookie
pub fn resolve_user_context(
    state: &AppState,
    headers: &HeaderMap,
    jar: &PrivateCookieJar,
) -> Option<UserContext> {
    let settings = &state.config;

    // 1. API key (service-to-service or CLI)
    if !settings.api_keys.is_empty() {
        let api_key = headers
            .get(settings.api_key_header.as_str())
            .and_then(|value| value.to_str().ok());

        if let Some(key) = api_key {
            if settings.api_keys.iter().any(|k| k == key) {
                return Some(UserContext::new_api_key());
            }
            tracing::debug!("Rejected unknown API key");
        }
    }

    // 2. Session cookie (browser)
    let cookie = jar.get(SESSION_COOKIE)?;
    match serde_json::from_str::<UserSession>(cookie.value()) {
        Ok(session) if !session.is_expired() => Some(UserContext::from_session(&session)),
        Ok(_) => {
            tracing::debug!("Session expired");
            None
        }
        Err(e) => {
            tracing::debug!("Unreadable session cookie: {}", e);
            None
        }
    }
}

/// API authentication. Unauthenticated calls get a JSON 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = resolve_user_context(&state, &headers, &jar)
        .ok_or_else(|| ApiError::authentication("Authentication required"))?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Page authentication. Unauthenticated browsers are sent to the login form.
pub async fn ui_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_user_context(&state, &headers, &jar) {
        Some(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}
