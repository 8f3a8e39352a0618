//! `/api/products`: public catalog reads, seller/admin listings

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use catalog_core::service::PRODUCT_CREATORS;
use catalog_core::{CreateProductRequest, Product, ProductPage, ProductQuery, UpdateProductRequest};

use super::extract::{ApiJson, ApiQuery, AuthUser};
use super::{ApiResult, ApiState};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:product_id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn list_products(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Json<ProductPage>> {
    Ok(Json(state.catalog.list_products(query).await?))
}

async fn get_product(
    State(state): State<ApiState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.catalog.get_product(&product_id).await?))
}

async fn create_product(
    State(state): State<ApiState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    user.require_role(PRODUCT_CREATORS)?;
    let product = state.catalog.create_product(&user, request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(product_id): Path<String>,
    ApiJson(request): ApiJson<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    let product = state
        .catalog
        .update_product(&user, &product_id, request)
        .await?;
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(product_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_product(&user, &product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
