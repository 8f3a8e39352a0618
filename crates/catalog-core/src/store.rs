//! Catalog persistence

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::types::Json;
use tracing::debug;

use crate::models::{Category, Product};
use crate::{Error, Result};

/// Catalog storage trait
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_category(&self, category: Category) -> Result<Category>;
    async fn get_category(&self, id: &str) -> Result<Option<Category>>;
    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>>;
    async fn list_active_categories(&self) -> Result<Vec<Category>>;
    /// Persist every field of an existing category
    async fn save_category(&self, category: &Category) -> Result<()>;

    async fn insert_product(&self, product: Product) -> Result<Product>;
    async fn get_product(&self, id: &str) -> Result<Option<Product>>;
    /// Active products whose name contains `keyword` (case-insensitive),
    /// plus the total number of matches
    async fn search_active_products(
        &self,
        keyword: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<Product>, u64)>;
    /// Persist every field of an existing product
    async fn save_product(&self, product: &Product) -> Result<()>;

    /// Remove every category and product. Used by the seeder only.
    async fn delete_all(&self) -> Result<u64>;
}

const CREATE_CATEGORIES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS categories (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        slug TEXT NOT NULL UNIQUE,
        description TEXT,
        parent_category_id TEXT,
        active BOOLEAN NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const CREATE_PRODUCTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL,
        description TEXT NOT NULL,
        price REAL NOT NULL,
        discount_price REAL,
        stock INTEGER NOT NULL DEFAULT 0,
        sku TEXT NOT NULL UNIQUE,
        category_id TEXT NOT NULL,
        seller_id TEXT NOT NULL,
        images TEXT NOT NULL,
        specifications TEXT NOT NULL,
        tags TEXT NOT NULL,
        rating REAL NOT NULL DEFAULT 0,
        active BOOLEAN NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, parent_category_id, active, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, discount_price, stock, sku, \
                               category_id, seller_id, images, specifications, tags, rating, \
                               active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    description: Option<String>,
    parent_category_id: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            parent_category_id: row.parent_category_id,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    slug: String,
    description: String,
    price: f64,
    discount_price: Option<f64>,
    stock: i64,
    sku: String,
    category_id: String,
    seller_id: String,
    images: Json<Vec<String>>,
    specifications: Json<BTreeMap<String, String>>,
    tags: Json<Vec<String>>,
    rating: f64,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            discount_price: row.discount_price,
            stock: row.stock,
            sku: row.sku,
            category_id: row.category_id,
            seller_id: row.seller_id,
            images: row.images.0,
            specifications: row.specifications.0,
            tags: row.tags.0,
            rating: row.rating,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// SQLite-backed catalog store
#[derive(Clone)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Connect and create the schema if needed
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::from_pool(pool).await
    }

    /// Reuse an existing pool
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_CATEGORIES_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_PRODUCTS_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Map a UNIQUE violation to [`Error::AlreadyExists`]
fn unique_or(err: sqlx::Error, message: &str) -> Error {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::AlreadyExists(message.to_string())
        }
        other => other.into(),
    }
}

/// Escape LIKE wildcards so user input matches literally
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn insert_category(&self, category: Category) -> Result<Category> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description, parent_category_id, active,
                                    created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.parent_category_id)
        .bind(category.active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or(e, "Category name already exists."))?;

        debug!("Inserted category {}", category.id);
        Ok(category)
    }

    async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS);
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Category::from))
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE name = ?", CATEGORY_COLUMNS);
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Category::from))
    }

    async fn list_active_categories(&self) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE active = 1 ORDER BY name",
            CATEGORY_COLUMNS
        );
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn save_category(&self, category: &Category) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = ?, slug = ?, description = ?, parent_category_id = ?, active = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.parent_category_id)
        .bind(category.active)
        .bind(category.updated_at)
        .bind(&category.id)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or(e, "Category name already exists."))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Category not found"));
        }
        Ok(())
    }

    async fn insert_product(&self, product: Product) -> Result<Product> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, slug, description, price, discount_price, stock, sku,
                                  category_id, seller_id, images, specifications, tags, rating,
                                  active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.stock)
        .bind(&product.sku)
        .bind(&product.category_id)
        .bind(&product.seller_id)
        .bind(Json(&product.images))
        .bind(Json(&product.specifications))
        .bind(Json(&product.tags))
        .bind(product.rating)
        .bind(product.active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or(e, "A product with this SKU already exists."))?;

        debug!("Inserted product {}", product.id);
        Ok(product)
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn search_active_products(
        &self,
        keyword: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<Product>, u64)> {
        let pattern = keyword.map(like_pattern);
        let filter = "active = 1 AND (?1 IS NULL OR LOWER(name) LIKE ?1 ESCAPE '\\')";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products WHERE {}", filter))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM products WHERE {} ORDER BY created_at DESC, id LIMIT ?2 OFFSET ?3",
            PRODUCT_COLUMNS, filter
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&pattern)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Product::from).collect(), total.max(0) as u64))
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?, slug = ?, description = ?, price = ?, discount_price = ?, stock = ?,
                sku = ?, category_id = ?, images = ?, specifications = ?, tags = ?, rating = ?,
                active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(product.stock)
        .bind(&product.sku)
        .bind(&product.category_id)
        .bind(Json(&product.images))
        .bind(Json(&product.specifications))
        .bind(Json(&product.tags))
        .bind(product.rating)
        .bind(product.active)
        .bind(product.updated_at)
        .bind(&product.id)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or(e, "A product with this SKU already exists."))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Product not found"));
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<u64> {
        let products = sqlx::query("DELETE FROM products").execute(&self.pool).await?;
        let categories = sqlx::query("DELETE FROM categories").execute(&self.pool).await?;
        Ok(products.rows_affected() + categories.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Pro"), "%pro%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
