//! `/api/categories`: public listing, admin-only writes

use accounts_core::Role;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use catalog_core::{Category, CreateCategoryRequest, UpdateCategoryRequest};

use super::extract::{ApiJson, AuthUser};
use super::{ApiResult, ApiState};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:category_id", put(update_category).delete(delete_category))
}

async fn list_categories(State(state): State<ApiState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.catalog.list_categories().await?))
}

async fn create_category(
    State(state): State<ApiState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    user.require_role(&[Role::Admin])?;
    let category = state.catalog.create_category(&user, request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(category_id): Path<String>,
    ApiJson(request): ApiJson<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    user.require_role(&[Role::Admin])?;
    let category = state
        .catalog
        .update_category(&user, &category_id, request)
        .await?;
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(category_id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require_role(&[Role::Admin])?;
    state.catalog.delete_category(&user, &category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
