//! Liveness probe and the JSON 404 fallback

use axum::{
    Json,
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use serde_json::json;

pub async fn root() -> &'static str {
    "E-Commerce API is running..."
}

pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("Not Found - {}", uri) })),
    )
}
