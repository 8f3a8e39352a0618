//! `/api/users`: the caller's own profile

use accounts_core::{ChangePasswordRequest, UpdateProfileRequest, User};
use axum::{Json, Router, extract::State, routing::{get, put}};
use serde_json::{Value, json};

use super::extract::{ApiJson, AuthUser};
use super::{ApiResult, ApiState};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/change-password", put(change_password))
}

async fn get_profile(State(state): State<ApiState>, user: AuthUser) -> ApiResult<Json<User>> {
    let found = state
        .sessions
        .credentials()
        .find_by_id(&user.user_id)
        .await?
        .ok_or_else(|| accounts_core::Error::UserNotFound(user.user_id.clone()))?;
    Ok(Json(found))
}

async fn update_profile(
    State(state): State<ApiState>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<Value>> {
    let updated = state
        .sessions
        .credentials()
        .update_profile(&user.user_id, request)
        .await?;

    Ok(Json(json!({
        "userId": updated.id,
        "firstName": updated.first_name,
        "lastName": updated.last_name,
        "email": updated.email,
        "phoneNumber": updated.phone_number,
    })))
}

async fn change_password(
    State(state): State<ApiState>,
    user: AuthUser,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    state.sessions.change_password(&user.user_id, request).await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}
