//! HTTP error mapping

use axum::{
    Json,
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use accounts_core::FieldError;

/// Error returned by every handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Accounts(#[from] accounts_core::Error),

    #[error(transparent)]
    Catalog(#[from] catalog_core::Error),

    /// No usable bearer token on a protected route
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed request body or query
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        use accounts_core::Error as A;
        use catalog_core::Error as C;

        match self {
            Self::Accounts(e) => match e {
                A::UserAlreadyExists(_) | A::Validation(_) => StatusCode::BAD_REQUEST,
                A::InvalidCredentials | A::IncorrectPassword | A::MissingToken => {
                    StatusCode::UNAUTHORIZED
                }
                A::InvalidToken(_) | A::Forbidden(_) => StatusCode::FORBIDDEN,
                A::UserNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog(e) => match e {
                C::NotFound(_) => StatusCode::NOT_FOUND,
                C::AlreadyExists(_) | C::BadRequest(_) | C::Validation(_) => {
                    StatusCode::BAD_REQUEST
                }
                C::Forbidden(_) => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to clients for non-internal errors
    fn public_message(&self) -> String {
        use accounts_core::Error as A;

        match self {
            Self::Accounts(A::UserAlreadyExists(_)) => "User already exists".to_string(),
            Self::Accounts(A::InvalidToken(_)) => "Invalid refresh token".to_string(),
            Self::Accounts(A::UserNotFound(_)) => "User not found".to_string(),
            Self::Accounts(A::Forbidden(_)) => "Not authorized for this action".to_string(),
            other => other.to_string(),
        }
    }

    fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Self::Accounts(accounts_core::Error::Validation(errors))
            | Self::Catalog(catalog_core::Error::Validation(errors)) => Some(errors),
            _ => None,
        }
    }
}

/// Text of a 500 error, attached to the response for [`expose_internal_errors`]
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let Some(errors) = self.field_errors() {
            return (status, Json(json!({ "errors": errors }))).into_response();
        }

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
            let mut response =
                (status, Json(json!({ "message": "Internal server error" }))).into_response();
            response
                .extensions_mut()
                .insert(InternalErrorDetail(self.to_string()));
            return response;
        }

        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}

/// Development middleware: rewrite 500 bodies to include the error text
pub async fn expose_internal_errors(request: Request<Body>, next: Next) -> Response {
    let response = next.run(request).await;
    match response.extensions().get::<InternalErrorDetail>().cloned() {
        Some(InternalErrorDetail(detail)) => (
            response.status(),
            Json(json!({ "message": "Internal server error", "detail": detail })),
        )
            .into_response(),
        None => response,
    }
}

/// Handler result
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (accounts_core::Error::UserAlreadyExists("a@b.com".into()).into(), StatusCode::BAD_REQUEST),
            (accounts_core::Error::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (accounts_core::Error::MissingToken.into(), StatusCode::UNAUTHORIZED),
            (accounts_core::Error::invalid_token("expired").into(), StatusCode::FORBIDDEN),
            (accounts_core::Error::forbidden("role").into(), StatusCode::FORBIDDEN),
            (accounts_core::Error::validation("email", "bad").into(), StatusCode::BAD_REQUEST),
            (accounts_core::Error::internal("boom").into(), StatusCode::INTERNAL_SERVER_ERROR),
            (catalog_core::Error::not_found("Product not found").into(), StatusCode::NOT_FOUND),
            (catalog_core::Error::AlreadyExists("dup".into()).into(), StatusCode::BAD_REQUEST),
            (ApiError::unauthorized("Not authorized, no token"), StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{:?}", err);
        }
    }

    #[test]
    fn test_messages_hide_internals() {
        let err: ApiError = accounts_core::Error::invalid_token("signature mismatch").into();
        assert_eq!(err.public_message(), "Invalid refresh token");

        let err: ApiError = accounts_core::Error::InvalidCredentials.into();
        assert_eq!(err.public_message(), "Invalid email or password");
    }
}
