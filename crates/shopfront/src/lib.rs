//! # Shopfront
//!
//! REST server for the Shopfront e-commerce backend. Wires
//! [`accounts_core`] (identities and sessions) and [`catalog_core`]
//! (categories and products) onto one SQLite database and exposes them
//! over axum.

pub mod api;
pub mod config;
pub mod seed;
pub mod telemetry;

use std::sync::Arc;

use accounts_core::{AccountsConfig, SessionAuthority, SqliteUserStore};
use catalog_core::CatalogService;

pub use api::{ApiState, create_router, create_router_with_state};
pub use config::ShopfrontConfig;

/// Open the database and build both services on a shared pool
pub async fn init_services(
    config: &AccountsConfig,
) -> anyhow::Result<(SessionAuthority, CatalogService)> {
    let user_store = SqliteUserStore::new(&config.database_url).await?;
    let catalog = catalog_core::init(user_store.pool().clone()).await?;
    let sessions = accounts_core::build(Arc::new(user_store), config.clone())?;
    Ok((sessions, catalog))
}
