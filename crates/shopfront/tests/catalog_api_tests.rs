//! REST tests for categories, products and profile management on the
//! sample dataset

mod common;

use axum::http::StatusCode;
use common::{server_config, spawn_app};
use serde_json::json;
use shopfront::seed::SAMPLE_PASSWORD;

fn new_product(sku: &str) -> serde_json::Value {
    json!({
        "name": "Kindle Paperwhite",
        "description": "A glare-free e-reader with adjustable warm light and weeks of battery",
        "price": 149.99,
        "stock": 12,
        "sku": sku,
        "categoryId": "cat_books",
        "images": ["/uploads/kindle.jpg"],
        "specifications": { "Storage": "16GB" },
        "tags": ["ebook"],
    })
}

#[tokio::test]
async fn test_public_catalog_reads() {
    let app = spawn_app(server_config(), true).await;

    let categories = app.get("/api/categories", None).await;
    assert_eq!(categories.status, StatusCode::OK);
    assert_eq!(categories.body.as_array().unwrap().len(), 4);

    let page = app.get("/api/products", None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["page"], 1);
    assert_eq!(page.body["pages"], 1);
    assert_eq!(page.body["products"].as_array().unwrap().len(), 3);

    let search = app.get("/api/products?keyword=pixel&pageNumber=1", None).await;
    let products = search.body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["productId"], "prod_pixel8");
    assert_eq!(products[0]["sellerId"], "user_seller001");

    let single = app.get("/api/products/prod_atomic_habits", None).await;
    assert_eq!(single.status, StatusCode::OK);
    assert_eq!(single.body["discountPrice"], 16.99);
    assert_eq!(single.body["specifications"]["Author"], "James Clear");

    let missing = app.get("/api/products/prod_missing", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.message(), "Product not found");

    let bad_page = app.get("/api/products?pageNumber=abc", None).await;
    assert_eq!(bad_page.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_category_administration() {
    let app = spawn_app(server_config(), true).await;
    let (admin, _) = app.login("admin@example.com", SAMPLE_PASSWORD).await;
    let (seller, _) = app.login("seller@example.com", SAMPLE_PASSWORD).await;

    let forbidden = app
        .post("/api/categories", Some(&seller), json!({ "name": "Garden" }))
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let created = app
        .post(
            "/api/categories",
            Some(&admin),
            json!({ "name": "Home and Garden", "parentCategoryId": "cat_electronics" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["slug"], "home-and-garden");
    let category_id = created.body["categoryId"].as_str().unwrap().to_string();

    let duplicate = app
        .post("/api/categories", Some(&admin), json!({ "name": "Books" }))
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.message(), "Category name already exists.");

    let updated = app
        .put(
            &format!("/api/categories/{}", category_id),
            Some(&admin),
            json!({ "name": "Garden", "parentCategoryId": "" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["slug"], "garden");
    assert!(updated.body["parentCategoryId"].is_null());

    let cycle = app
        .put(
            "/api/categories/cat_electronics",
            Some(&admin),
            json!({ "parentCategoryId": "cat_laptops" }),
        )
        .await;
    assert_eq!(cycle.status, StatusCode::BAD_REQUEST);

    let deleted = app
        .delete(&format!("/api/categories/{}", category_id), Some(&admin))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let listed = app.get("/api/categories", None).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 4);

    let missing = app
        .put("/api/categories/cat_missing", Some(&admin), json!({ "name": "X" }))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_listing_and_ownership() {
    let app = spawn_app(server_config(), true).await;
    let (admin, _) = app.login("admin@example.com", SAMPLE_PASSWORD).await;
    let (seller, _) = app.login("seller@example.com", SAMPLE_PASSWORD).await;
    let (customer, _) = app.login("customer@example.com", SAMPLE_PASSWORD).await;

    let denied = app
        .post("/api/products", Some(&customer), new_product("KND-1"))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let mut no_images = new_product("KND-1");
    no_images["images"] = json!([]);
    let rejected = app.post("/api/products", Some(&seller), no_images).await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected.message(), "At least one image is required.");

    let created = app
        .post("/api/products", Some(&seller), new_product("KND-1"))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["sellerId"], "user_seller001");
    assert_eq!(created.body["slug"], "kindle-paperwhite");
    assert_eq!(created.body["rating"], 0.0);

    let duplicate_sku = app
        .post("/api/products", Some(&seller), new_product("KND-1"))
        .await;
    assert_eq!(duplicate_sku.status, StatusCode::BAD_REQUEST);

    // The admin owns Atomic Habits; the seller may not touch it
    let not_owner = app
        .put(
            "/api/products/prod_atomic_habits",
            Some(&seller),
            json!({ "price": 1.0 }),
        )
        .await;
    assert_eq!(not_owner.status, StatusCode::FORBIDDEN);
    assert_eq!(not_owner.message(), "User not authorized to update this product");

    let admin_edit = app
        .put(
            "/api/products/prod_pixel8",
            Some(&admin),
            json!({ "stock": 0 }),
        )
        .await;
    assert_eq!(admin_edit.status, StatusCode::OK);
    assert_eq!(admin_edit.body["stock"], 0);

    let invalid = app
        .put(
            "/api/products/prod_pixel8",
            Some(&seller),
            json!({ "price": -5 }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["errors"][0]["field"], "price");

    let deleted = app.delete("/api/products/prod_pixel8", Some(&seller)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let gone = app.get("/api/products/prod_pixel8", None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_management() {
    let app = spawn_app(server_config(), true).await;
    let (token, cookie) = app.login("customer@example.com", SAMPLE_PASSWORD).await;

    let profile = app.get("/api/users/profile", Some(&token)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["email"], "customer@example.com");
    assert!(profile.body.get("passwordHash").is_none());
    assert!(profile.body.get("refreshTokenHash").is_none());

    let updated = app
        .put(
            "/api/users/profile",
            Some(&token),
            json!({ "firstName": "Robert", "lastName": "", "phoneNumber": "555-0100" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["firstName"], "Robert");
    assert_eq!(updated.body["lastName"], "Customer");
    assert_eq!(updated.body["phoneNumber"], "555-0100");

    let wrong_old = app
        .put(
            "/api/users/change-password",
            Some(&token),
            json!({ "oldPassword": "not-it", "newPassword": "brand-new" }),
        )
        .await;
    assert_eq!(wrong_old.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_old.message(), "Invalid old password");

    let changed = app
        .put(
            "/api/users/change-password",
            Some(&token),
            json!({ "oldPassword": SAMPLE_PASSWORD, "newPassword": "brand-new" }),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);

    // The existing refresh token survives a password change
    let refreshed = app
        .request(
            axum::http::Method::POST,
            "/api/auth/refresh-token",
            None,
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);

    app.login("customer@example.com", "brand-new").await;
}
