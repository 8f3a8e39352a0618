//! Catalog operations: category hierarchy and product listings

use std::collections::HashSet;
use std::sync::Arc;

use accounts_core::validation::field_errors;
use accounts_core::{Principal, Role};
use chrono::Utc;
use tracing::{debug, info};
use validator::Validate;

use crate::models::{
    Category, CreateCategoryRequest, CreateProductRequest, PAGE_SIZE, Product, ProductPage,
    ProductQuery, UpdateCategoryRequest, UpdateProductRequest,
};
use crate::slug::slugify;
use crate::store::CatalogStore;
use crate::{Error, Result};

/// Roles allowed to list products for sale
pub const PRODUCT_CREATORS: &[Role] = &[Role::Seller, Role::Admin];

fn validate<T: Validate>(request: &T) -> Result<()> {
    request
        .validate()
        .map_err(|errors| Error::Validation(field_errors(&errors)))
}

fn require_admin(principal: &Principal) -> Result<()> {
    principal
        .require_role(&[Role::Admin])
        .map_err(|_| Error::forbidden("Not authorized for this action"))
}

/// Trimmed value, or `None` when blank
fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    pub async fn create_category(
        &self,
        principal: &Principal,
        request: CreateCategoryRequest,
    ) -> Result<Category> {
        require_admin(principal)?;
        validate(&request)?;

        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("name", "Category name is required"));
        }
        if self.store.get_category_by_name(&name).await?.is_some() {
            return Err(Error::AlreadyExists("Category name already exists.".into()));
        }

        let parent_category_id = present(request.parent_category_id.as_deref());
        if let Some(parent_id) = &parent_category_id {
            self.existing_category(parent_id, "Parent category not found")
                .await?;
        }

        let now = Utc::now();
        let category = self
            .store
            .insert_category(Category {
                id: Category::new_id(),
                slug: slugify(&name),
                name,
                description: present(request.description.as_deref()),
                parent_category_id,
                active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("Created category {} ({})", category.id, category.slug);
        Ok(category)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.store.list_active_categories().await
    }

    /// Apply a partial update. Moving a category under one of its own
    /// descendants is rejected.
    pub async fn update_category(
        &self,
        principal: &Principal,
        category_id: &str,
        request: UpdateCategoryRequest,
    ) -> Result<Category> {
        require_admin(principal)?;
        let mut category = self
            .existing_category(category_id, "Category not found")
            .await?;

        if let Some(name) = request.name.as_deref() {
            let name = name.trim();
            if name.is_empty() || name.chars().count() > 100 {
                return Err(Error::validation("name", "Category name is required"));
            }
            if name != category.name {
                if self.store.get_category_by_name(name).await?.is_some() {
                    return Err(Error::AlreadyExists("Category name already exists.".into()));
                }
                category.name = name.to_string();
                category.slug = slugify(name);
            }
        }

        if let Some(description) = request.description {
            category.description = present(Some(&description));
        }

        if let Some(parent) = request.parent_category_id.as_deref() {
            match present(Some(parent)) {
                None => category.parent_category_id = None,
                Some(parent_id) => {
                    self.check_parent(&category.id, &parent_id).await?;
                    category.parent_category_id = Some(parent_id);
                }
            }
        }

        if let Some(active) = request.is_active {
            category.active = active;
        }

        category.updated_at = Utc::now();
        self.store.save_category(&category).await?;
        info!("Updated category {}", category.id);
        Ok(category)
    }

    /// Soft delete
    pub async fn delete_category(&self, principal: &Principal, category_id: &str) -> Result<()> {
        require_admin(principal)?;
        let mut category = self
            .existing_category(category_id, "Category not found")
            .await?;
        category.active = false;
        category.updated_at = Utc::now();
        self.store.save_category(&category).await?;
        info!("Deactivated category {}", category.id);
        Ok(())
    }

    pub async fn create_product(
        &self,
        principal: &Principal,
        request: CreateProductRequest,
    ) -> Result<Product> {
        principal
            .require_role(PRODUCT_CREATORS)
            .map_err(|_| Error::forbidden("Not authorized for this action"))?;
        validate(&request)?;

        let images: Vec<String> = request
            .images
            .iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        if images.is_empty() {
            return Err(Error::BadRequest("At least one image is required.".into()));
        }

        let category_id = request.category_id.trim().to_string();
        self.active_category(&category_id).await?;

        let name = request.name.trim().to_string();
        let now = Utc::now();
        let product = self
            .store
            .insert_product(Product {
                id: Product::new_id(),
                slug: slugify(&name),
                name,
                description: request.description,
                price: request.price,
                discount_price: request.discount_price,
                stock: request.stock,
                sku: request.sku.trim().to_string(),
                category_id,
                seller_id: principal.user_id.clone(),
                images,
                specifications: request.specifications,
                tags: request.tags,
                rating: 0.0,
                active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("Seller {} listed product {}", product.seller_id, product.id);
        Ok(product)
    }

    /// One page of active products, newest first. Pages are 1-based; a
    /// missing or zero page number means the first page.
    pub async fn list_products(&self, query: ProductQuery) -> Result<ProductPage> {
        let page = query.page_number.unwrap_or(1).max(1);
        let keyword = present(query.keyword.as_deref());
        let offset = (page - 1).saturating_mul(PAGE_SIZE);

        let (products, total) = self
            .store
            .search_active_products(keyword.as_deref(), PAGE_SIZE, offset)
            .await?;
        let pages = total.div_ceil(u64::from(PAGE_SIZE));

        debug!(
            "Product page {} of {} ({} matches)",
            page, pages, total
        );
        Ok(ProductPage {
            products,
            page,
            pages: u32::try_from(pages).unwrap_or(u32::MAX),
        })
    }

    /// Active product by id
    pub async fn get_product(&self, product_id: &str) -> Result<Product> {
        match self.store.get_product(product_id).await? {
            Some(product) if product.active => Ok(product),
            _ => Err(Error::not_found("Product not found")),
        }
    }

    /// Product by id whether or not it has been soft deleted
    async fn stored_product(&self, product_id: &str) -> Result<Product> {
        self.store
            .get_product(product_id)
            .await?
            .ok_or_else(|| Error::not_found("Product not found"))
    }

    pub async fn update_product(
        &self,
        principal: &Principal,
        product_id: &str,
        request: UpdateProductRequest,
    ) -> Result<Product> {
        validate(&request)?;
        let mut product = self.stored_product(product_id).await?;
        if !owns_or_admin(principal, &product) {
            return Err(Error::forbidden("User not authorized to update this product"));
        }

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(Error::validation("name", "Product name cannot be empty"));
            }
            product.slug = slugify(&name);
            product.name = name;
        }
        if let Some(description) = request.description {
            product.description = description;
        }
        if let Some(price) = request.price {
            product.price = price;
        }
        if let Some(stock) = request.stock {
            product.stock = stock;
        }
        if let Some(category_id) = request.category_id {
            let category_id = category_id.trim().to_string();
            if category_id != product.category_id {
                self.active_category(&category_id).await?;
                product.category_id = category_id;
            }
        }

        product.updated_at = Utc::now();
        self.store.save_product(&product).await?;
        info!("Updated product {}", product.id);
        Ok(product)
    }

    /// Soft delete
    pub async fn delete_product(&self, principal: &Principal, product_id: &str) -> Result<()> {
        let mut product = self.stored_product(product_id).await?;
        if !owns_or_admin(principal, &product) {
            return Err(Error::forbidden("User not authorized to delete this product"));
        }
        product.active = false;
        product.updated_at = Utc::now();
        self.store.save_product(&product).await?;
        info!("Deactivated product {}", product.id);
        Ok(())
    }

    async fn existing_category(&self, id: &str, missing: &str) -> Result<Category> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| Error::not_found(missing))
    }

    async fn active_category(&self, id: &str) -> Result<Category> {
        match self.store.get_category(id).await? {
            Some(category) if category.active => Ok(category),
            _ => Err(Error::not_found("Category not found")),
        }
    }

    /// `parent_id` must exist and must not be `category_id` or one of its
    /// descendants
    async fn check_parent(&self, category_id: &str, parent_id: &str) -> Result<()> {
        if parent_id == category_id {
            return Err(Error::BadRequest("A category cannot be its own parent".into()));
        }

        let parent = self
            .existing_category(parent_id, "Parent category not found")
            .await?;

        let mut seen = HashSet::from([parent.id]);
        let mut cursor = parent.parent_category_id;
        while let Some(id) = cursor {
            if id == category_id {
                return Err(Error::BadRequest(
                    "A category cannot be moved under its own subcategory".into(),
                ));
            }
            if !seen.insert(id.clone()) {
                break;
            }
            cursor = self
                .store
                .get_category(&id)
                .await?
                .and_then(|c| c.parent_category_id);
        }
        Ok(())
    }
}

fn owns_or_admin(principal: &Principal, product: &Product) -> bool {
    principal.is_admin() || principal.user_id == product.seller_id
}
