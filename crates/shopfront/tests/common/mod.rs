//! Shared harness: an in-process router on a throwaway SQLite database

#![allow(dead_code)]

use accounts_core::{AccountsConfig, JwtConfig, PasswordConfig};
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use shopfront::config::ServerConfig;
use shopfront::{create_router, init_services, seed};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    _temp_dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    /// `name=value` part of the `Set-Cookie` header
    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string())
    }
}

pub fn server_config() -> ServerConfig {
    ServerConfig {
        secure_cookies: false,
        rate_limit_per_window: 0,
        ..Default::default()
    }
}

pub async fn spawn_app(server: ServerConfig, with_sample_data: bool) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("shopfront.db");

    let accounts = AccountsConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        jwt: JwtConfig {
            access_secret: Some("api-test-access-secret".to_string()),
            refresh_secret: Some("api-test-refresh-secret".to_string()),
            ..Default::default()
        },
        password: PasswordConfig::fast_for_tests(),
    };

    let (sessions, catalog) = init_services(&accounts).await.unwrap();
    if with_sample_data {
        seed::import(&sessions, &catalog).await.unwrap();
    }

    TestApp {
        router: create_router(sessions, catalog, &server),
        _temp_dir: temp_dir,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, None, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, None, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None, None).await
    }

    /// Log in and return `(access token, refresh cookie pair)`
    pub async fn login(&self, email: &str, password: &str) -> (String, String) {
        let response = self
            .post(
                "/api/auth/login",
                None,
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);

        let access_token = response.body["accessToken"].as_str().unwrap().to_string();
        let cookie = response.set_cookie().unwrap();
        let pair = cookie.split(';').next().unwrap().to_string();
        (access_token, pair)
    }
}
