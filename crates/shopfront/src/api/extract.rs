//! Request extractors: bearer authentication and JSON/query bodies with
//! JSON error responses

use std::ops::Deref;

use accounts_core::{Principal, Role};
use axum::{
    async_trait,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::{ApiError, ApiResult, ApiState};

/// JSON body; parse failures become 400 `{message}`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string; parse failures become 400 `{message}`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Caller authenticated by `Authorization: Bearer <access token>`.
///
/// Missing or unverifiable tokens are rejected with 401 before the handler
/// runs. The role carried in the token is available for gating.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    /// 403 unless the caller holds one of `allowed`
    pub fn require_role(&self, allowed: &[Role]) -> ApiResult<()> {
        self.0.require_role(allowed).map_err(ApiError::from)
    }
}

impl Deref for AuthUser {
    type Target = Principal;

    fn deref(&self) -> &Principal {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<ApiState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))?;

        match state.sessions.verify_access_token(&token) {
            Ok(principal) => Ok(AuthUser(principal)),
            Err(e) if e.is_internal() => Err(e.into()),
            Err(_) => {
                warn!("Rejected access token on {}", parts.uri.path());
                Err(ApiError::unauthorized("Not authorized, token failed"))
            }
        }
    }
}

/// Token from `Authorization: Bearer <token>`, if present and non-empty
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);
    }
}
