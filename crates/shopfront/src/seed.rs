//! Sample dataset for development databases

use std::collections::BTreeMap;

use accounts_core::{CreateUserRequest, Role, SessionAuthority};
use catalog_core::{CatalogService, Category, Product, slugify};
use chrono::Utc;
use tracing::info;

pub const SAMPLE_PASSWORD: &str = "password123";

/// Record counts written by [`import`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub categories: usize,
    pub products: usize,
}

/// Delete every user, category and product
pub async fn destroy(sessions: &SessionAuthority, catalog: &CatalogService) -> anyhow::Result<()> {
    let catalog_rows = catalog.store().delete_all().await?;
    let users = sessions.credentials().user_store().delete_all().await?;
    info!("Removed {} users and {} catalog records", users, catalog_rows);
    Ok(())
}

/// Replace all data with the sample dataset
pub async fn import(
    sessions: &SessionAuthority,
    catalog: &CatalogService,
) -> anyhow::Result<SeedSummary> {
    destroy(sessions, catalog).await?;

    let users = [
        ("user_admin001", "Admin", "User", "admin@example.com", Role::Admin),
        ("user_seller001", "Alice", "Seller", "seller@example.com", Role::Seller),
        ("user_customer001", "Bob", "Customer", "customer@example.com", Role::Customer),
    ];
    for (id, first_name, last_name, email, role) in users {
        sessions
            .credentials()
            .create_with_id(
                id.to_string(),
                CreateUserRequest {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    email: email.to_string(),
                    password: SAMPLE_PASSWORD.to_string(),
                    role: Some(role),
                },
            )
            .await?;
    }

    let categories = [
        ("cat_electronics", "Electronics", "Gadgets and devices", None),
        (
            "cat_laptops",
            "Laptops",
            "Powerful and portable computers",
            Some("cat_electronics"),
        ),
        (
            "cat_smartphones",
            "Smartphones",
            "Mobile phones with advanced features",
            Some("cat_electronics"),
        ),
        ("cat_books", "Books", "Printed and digital books", None),
    ];
    let now = Utc::now();
    for (id, name, description, parent) in categories {
        catalog
            .store()
            .insert_category(Category {
                id: id.to_string(),
                name: name.to_string(),
                slug: slugify(name),
                description: Some(description.to_string()),
                parent_category_id: parent.map(str::to_string),
                active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    let products = sample_products();
    let product_count = products.len();
    for product in products {
        catalog.store().insert_product(product).await?;
    }

    let summary = SeedSummary {
        users: users.len(),
        categories: categories.len(),
        products: product_count,
    };
    info!(
        "Seeded {} users, {} categories and {} products",
        summary.users, summary.categories, summary.products
    );
    Ok(summary)
}

fn specs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn sample_products() -> Vec<Product> {
    let now = Utc::now();
    let product = |id: &str,
                   name: &str,
                   description: &str,
                   price: f64,
                   stock: i64,
                   sku: &str,
                   category_id: &str,
                   seller_id: &str| Product {
        id: id.to_string(),
        name: name.to_string(),
        slug: slugify(name),
        description: description.to_string(),
        price,
        discount_price: None,
        stock,
        sku: sku.to_string(),
        category_id: category_id.to_string(),
        seller_id: seller_id.to_string(),
        images: Vec::new(),
        specifications: BTreeMap::new(),
        tags: Vec::new(),
        rating: 0.0,
        active: true,
        created_at: now,
        updated_at: now,
    };

    vec![
        Product {
            images: strings(&["/uploads/sample_laptop1.jpg", "/uploads/sample_laptop2.jpg"]),
            specifications: specs(&[
                ("RAM", "16GB"),
                ("Storage", "512GB SSD"),
                ("Processor", "Apple M3"),
                ("Color", "Space Gray"),
            ]),
            tags: strings(&["apple", "laptop", "professional"]),
            rating: 4.9,
            ..product(
                "prod_macbookpro",
                "MacBook Pro 14\"",
                "The MacBook Pro 14\" with M3 chip is a powerhouse for professionals, offering \
                 exceptional performance, a stunning Liquid Retina XDR display, and all-day \
                 battery life.",
                1999.99,
                25,
                "MBP14-M3-512",
                "cat_laptops",
                "user_seller001",
            )
        },
        Product {
            images: strings(&["/uploads/sample_phone1.jpg"]),
            specifications: specs(&[
                ("RAM", "8GB"),
                ("Storage", "128GB"),
                ("Camera", "50MP"),
                ("Color", "Obsidian"),
            ]),
            tags: strings(&["google", "pixel", "android", "smartphone"]),
            rating: 4.7,
            ..product(
                "prod_pixel8",
                "Google Pixel 8",
                "The Google Pixel 8 features the Google Tensor G3 chip, a camera system with \
                 AI-powered editing tools, and a bright display.",
                699.0,
                50,
                "GGL-PXL8-128",
                "cat_smartphones",
                "user_seller001",
            )
        },
        Product {
            discount_price: Some(16.99),
            images: strings(&["/uploads/sample_book1.jpg"]),
            specifications: specs(&[
                ("Author", "James Clear"),
                ("Pages", "320"),
                ("Format", "Hardcover"),
            ]),
            tags: strings(&["self-help", "habits", "bestseller"]),
            rating: 4.8,
            ..product(
                "prod_atomic_habits",
                "Atomic Habits",
                "An easy and proven way to build good habits and break bad ones, with practical \
                 strategies for mastering the tiny behaviors that lead to remarkable results.",
                27.0,
                150,
                "BK-9780735211292",
                "cat_books",
                "user_admin001",
            )
        },
    ]
}
