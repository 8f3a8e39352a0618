//! Fixed-window request rate limiting per client address

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// Windows are pruned once the table grows past this many clients
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window. Zero disables limiting.
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("Too many requests, please try again later.")]
    TooManyRequests { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<DashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Count one request from `client` against its current window
    pub async fn check_rate_limit(&self, client: &str) -> Result<(), RateLimitError> {
        if self.config.max_requests == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let window_len = self.config.window;

        if self.windows.len() > PRUNE_THRESHOLD {
            self.windows
                .retain(|_, w| now.duration_since(w.started) < window_len);
        }

        // The entry guard locks this client's shard until it drops
        let mut window = self.windows.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= window_len {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count >= self.config.max_requests {
            let elapsed = now.duration_since(window.started);
            return Err(RateLimitError::TooManyRequests {
                retry_after: window_len.saturating_sub(elapsed),
            });
        }

        window.count += 1;
        Ok(())
    }
}

/// Client key: the peer address when known, else the first
/// `X-Forwarded-For` entry
fn client_key(request: &Request<Body>) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&request);
    match limiter.check_rate_limit(&client).await {
        Ok(()) => next.run(request).await,
        Err(err) => {
            let RateLimitError::TooManyRequests { retry_after } = &err;
            warn!("Rate limit exceeded for {}", client);

            // Round up so clients never retry a moment too early
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "message": err.to_string() })),
            )
                .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window: Duration) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window,
        })
    }

    #[tokio::test]
    async fn test_limit_per_client() {
        let limiter = limiter(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(limiter.check_rate_limit("10.0.0.1").await.is_ok());
        }
        let err = limiter.check_rate_limit("10.0.0.1").await.unwrap_err();
        let RateLimitError::TooManyRequests { retry_after } = err;
        assert!(retry_after <= Duration::from_secs(60));
        assert!(retry_after > Duration::from_secs(50));

        assert!(limiter.check_rate_limit("10.0.0.2").await.is_ok());
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = limiter(1, Duration::from_millis(100));

        assert!(limiter.check_rate_limit("client").await.is_ok());
        assert!(limiter.check_rate_limit("client").await.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(limiter.check_rate_limit("client").await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_disables_limiting() {
        let limiter = limiter(0, Duration::from_secs(60));
        for _ in 0..500 {
            assert!(limiter.check_rate_limit("client").await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_expired_windows_pruned() {
        let limiter = limiter(5, Duration::from_millis(50));

        for i in 0..=PRUNE_THRESHOLD {
            limiter.check_rate_limit(&format!("10.1.{}", i)).await.unwrap();
        }
        assert_eq!(limiter.windows.len(), PRUNE_THRESHOLD + 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        limiter.check_rate_limit("fresh").await.unwrap();
        assert_eq!(limiter.windows.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_counted_exactly() {
        let limiter = limiter(10, Duration::from_secs(60));

        let mut handles = Vec::new();
        for _ in 0..15 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.check_rate_limit("concurrent").await.is_ok()
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 10);
    }
}
