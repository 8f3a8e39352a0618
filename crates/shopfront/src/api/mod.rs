//! REST API for Shopfront

pub mod auth;
pub mod categories;
pub mod error;
pub mod extract;
pub mod health;
pub mod products;
pub mod rate_limit;
pub mod security_headers;
pub mod users;

use std::sync::Arc;

use accounts_core::SessionAuthority;
use axum::{Router, middleware, routing::get};
use catalog_core::CatalogService;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use self::auth::CookieSettings;
use self::rate_limit::{RateLimitConfig, RateLimiter, rate_limit_middleware};
use self::security_headers::security_headers_middleware;

pub use self::error::{ApiError, ApiResult};

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<SessionAuthority>,
    pub catalog: Arc<CatalogService>,
    pub rate_limiter: RateLimiter,
    pub cookies: CookieSettings,
    pub expose_internal_errors: bool,
    pub allow_admin_registration: bool,
}

impl ApiState {
    pub fn new(sessions: SessionAuthority, catalog: CatalogService, server: &ServerConfig) -> Self {
        let cookies = CookieSettings {
            secure: server.secure_cookies,
            max_age_seconds: sessions.jwt_issuer().config().refresh_ttl_seconds,
        };
        Self {
            sessions: Arc::new(sessions),
            catalog: Arc::new(catalog),
            rate_limiter: RateLimiter::new(RateLimitConfig {
                max_requests: server.rate_limit_per_window,
                window: server.rate_limit_window(),
            }),
            cookies,
            expose_internal_errors: server.expose_internal_errors,
            allow_admin_registration: server.allow_admin_registration,
        }
    }
}

/// Create the REST API router
pub fn create_router(
    sessions: SessionAuthority,
    catalog: CatalogService,
    server: &ServerConfig,
) -> Router {
    create_router_with_state(ApiState::new(sessions, catalog, server))
}

/// Create the REST API router on prepared state
pub fn create_router_with_state(state: ApiState) -> Router {
    let rate_limiter = state.rate_limiter.clone();
    let expose_internal_errors = state.expose_internal_errors;

    let mut router = Router::new()
        .route("/", get(health::root))
        .nest("/api/auth", auth::routes())
        .nest("/api/users", users::routes())
        .nest("/api/categories", categories::routes())
        .nest("/api/products", products::routes())
        .fallback(health::not_found)
        .with_state(state);

    if expose_internal_errors {
        router = router.layer(middleware::from_fn(error::expose_internal_errors));
    }

    router
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
