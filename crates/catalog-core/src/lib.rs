//! # Catalog-Core
//!
//! Category hierarchy and product listings for Shopfront.
//!
//! Reads are public. Writes take the caller's [`accounts_core::Principal`]:
//! categories are administered by admins only, products by the seller who
//! listed them or an admin. Nothing is hard-deleted; deletes clear the
//! active flag.

pub mod error;
pub mod models;
pub mod service;
pub mod slug;
pub mod store;

pub use error::{Error, Result};
pub use models::{
    Category, CreateCategoryRequest, CreateProductRequest, PAGE_SIZE, Product, ProductPage,
    ProductQuery, UpdateCategoryRequest, UpdateProductRequest,
};
pub use service::CatalogService;
pub use slug::slugify;
pub use store::{CatalogStore, SqliteCatalogStore};

use std::sync::Arc;

use sqlx::SqlitePool;

/// Initialize the catalog on an existing connection pool
pub async fn init(pool: SqlitePool) -> Result<CatalogService> {
    let store = SqliteCatalogStore::from_pool(pool).await?;
    Ok(CatalogService::new(Arc::new(store)))
}
