use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::Deserialize;

use super::ApiJson;
use crate::{
    auth::{UserContext, UserSession, SESSION_COOKIE},
    error::ApiError,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct LocalLoginParams {
    pub email: String,
    pub password: String,
}

/// Add the serialized session to the private jar
pub fn session_cookie(
    state: &AppState,
    jar: PrivateCookieJar,
    session: &UserSession,
) -> Result<PrivateCookieJar, ApiError> {
    let session_str = serde_json::to_string(session).map_err(ApiError::Serialization)?;

    let cookie = Cookie::build((SESSION_COOKIE, session_str))
        .path("/")
        .secure(state.config.is_production())
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok(jar.add(cookie))
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

pub async fn login_local(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    ApiJson(params): ApiJson<LocalLoginParams>,
) -> Result<(PrivateCookieJar, Json<UserSession>), ApiError> {
    let session = state
        .auth_service
        .login_local(&params.email, &params.password)
        .await?;

    let jar = session_cookie(&state, jar, &session)?;
    Ok((jar, Json(session)))
}

pub async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, StatusCode) {
    (clear_session_cookie(jar), StatusCode::NO_CONTENT)
}

pub async fn get_me(Extension(user): Extension<UserContext>) -> Json<UserContext> {
    Json(user)
}
