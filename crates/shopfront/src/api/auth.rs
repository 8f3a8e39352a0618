//! `/api/auth`: registration and the session token lifecycle
//!
//! The access token travels in the JSON body and is presented back as a
//! bearer token. The refresh token only ever travels in an `HttpOnly`,
//! `SameSite=Strict` cookie.

use accounts_core::validation::validate_request;
use accounts_core::{CreateUserRequest, LoginRequest, Role};
use axum::{
    Json, Router,
    extract::State,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{COOKIE, SET_COOKIE},
    },
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use super::extract::{ApiJson, AuthUser};
use super::{ApiError, ApiResult, ApiState};

pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Attributes of the refresh-token cookie
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_seconds: u64,
}

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
}

async fn register(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.role == Some(Role::Admin) && !state.allow_admin_registration {
        return Err(accounts_core::Error::forbidden("cannot self-register as admin").into());
    }

    let user = state.sessions.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "userId": user.user_id,
        })),
    ))
}

async fn login(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_request(&request)?;
    let result = state.sessions.login(&request.email, &request.password).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        refresh_cookie(&state.cookies, &result.refresh_token)?,
    );

    Ok((
        headers,
        Json(json!({
            "userId": result.user.user_id,
            "email": result.user.email,
            "role": result.user.role,
            "accessToken": result.access_token,
        })),
    ))
}

async fn refresh_token(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let presented = cookie_value(&headers, REFRESH_COOKIE_NAME);
    let result = state.sessions.refresh(presented.as_deref()).await?;
    Ok(Json(json!({ "accessToken": result.access_token })))
}

async fn logout(State(state): State<ApiState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
    state.sessions.logout(&user.user_id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, clear_refresh_cookie(&state.cookies)?);
    Ok((
        headers,
        Json(json!({ "message": "Logged out successfully" })),
    ))
}

/// `Set-Cookie` value carrying a refresh token
pub fn refresh_cookie(settings: &CookieSettings, token: &str) -> ApiResult<HeaderValue> {
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        settings.max_age_seconds
    );
    if settings.secure {
        cookie.push_str("; Secure");
    }
    header_value(cookie)
}

/// `Set-Cookie` value that expires the refresh-token cookie
pub fn clear_refresh_cookie(settings: &CookieSettings) -> ApiResult<HeaderValue> {
    let mut cookie = format!("{REFRESH_COOKIE_NAME}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0");
    if settings.secure {
        cookie.push_str("; Secure");
    }
    header_value(cookie)
}

fn header_value(cookie: String) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::from(accounts_core::Error::internal(format!("bad cookie: {}", e))))
}

/// Value of the named cookie across all `Cookie` headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| val.trim().to_string())
        })
        .find(|val| !val.is_empty())
}
