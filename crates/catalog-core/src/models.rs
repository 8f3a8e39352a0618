//! Catalog records and request payloads

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Products returned per listing page
pub const PAGE_SIZE: u32 = 10;

/// Node in the category hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "categoryId")]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_category_id: Option<String>,
    #[serde(rename = "isActive")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new_id() -> String {
        format!("cat_{}", Uuid::new_v4().simple())
    }
}

/// Catalog listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "productId")]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub stock: i64,
    pub sku: String,
    pub category_id: String,
    pub seller_id: String,
    pub images: Vec<String>,
    pub specifications: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub rating: f64,
    #[serde(rename = "isActive")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new_id() -> String {
        format!("prod_{}", Uuid::new_v4().simple())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Category name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub parent_category_id: Option<String>,
}

/// Partial category update. `parentCategoryId: ""` moves the category to
/// the root; an absent field keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_category_id: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Product name is required"))]
    pub name: String,
    #[validate(length(min = 20, message = "Description must be at least 20 characters long"))]
    pub description: String,
    #[validate(range(exclusive_min = 0.0, message = "Price must be a positive number"))]
    pub price: f64,
    #[serde(rename = "discountPrice")]
    #[validate(range(min = 0.0, message = "Discount price must not be negative"))]
    pub discount_price: Option<f64>,
    #[validate(range(min = 0, message = "Stock must be a non-negative integer"))]
    pub stock: i64,
    #[validate(length(min = 1, message = "SKU is required"))]
    pub sku: String,
    #[serde(rename = "categoryId")]
    #[validate(length(min = 1, message = "Category ID is required"))]
    pub category_id: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Product name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 20, message = "Description must be at least 20 characters long"))]
    pub description: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Price must be a positive number"))]
    pub price: Option<f64>,
    #[validate(range(min = 0, message = "Stock must be a non-negative integer"))]
    pub stock: Option<i64>,
    #[serde(rename = "categoryId")]
    #[validate(length(min = 1, message = "Category ID cannot be empty"))]
    pub category_id: Option<String>,
}

/// Listing query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub keyword: Option<String>,
    pub page_number: Option<u32>,
}

/// One page of active products
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub pages: u32,
}
