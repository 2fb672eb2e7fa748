//! Shared test utilities for the catalog API.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        analytics::{self, EventInput},
        auth::{self, NewAccount},
        category::{self, CategoryInput},
        product::{self, ProductInput},
    },
    entities::{self, EventType},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Installs a test-writer tracing subscriber. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Creates a test category.
///
/// # Defaults
/// * `description`: `"{name} category"`
/// * `image`: None
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    category::create_category(
        db,
        CategoryInput {
            name: name.to_string(),
            description: format!("{name} category"),
            image: None,
        },
    )
    .await
}

/// Builds a product payload with sensible defaults.
///
/// # Defaults
/// * `description`: `"Test product description"`
/// * `images`: empty
/// * `seller_phone`: `"+15550100"`
/// * `seller_name`: `"Test Seller"`
pub fn product_input(name: &str, price: Decimal, category_id: i64) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: "Test product description".to_string(),
        price,
        category_id,
        images: Vec::new(),
        seller_phone: "+15550100".to_string(),
        seller_name: "Test Seller".to_string(),
    }
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * price: 10.00
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    category_id: i64,
) -> Result<entities::product::Model> {
    create_custom_product(db, name, Decimal::new(1000, 2), category_id).await
}

/// Creates a test product with custom price.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
    category_id: i64,
) -> Result<entities::product::Model> {
    let created = product::create_product(db, product_input(name, price, category_id)).await?;
    Ok(created.product)
}

/// Sets up a complete test environment with a category.
/// Returns (db, category) for common test scenarios.
pub async fn setup_with_category() -> Result<(DatabaseConnection, entities::category::Model)> {
    let db = setup_test_db().await?;
    let category = create_test_category(&db, "Test Category").await?;
    Ok((db, category))
}

/// Builds an event payload of the given type with no references.
pub fn event_input(event_type: EventType) -> EventInput {
    EventInput {
        event_type,
        product_id: None,
        category_id: None,
        search_term: None,
        timestamp: chrono::Utc::now(),
        session_id: "test-session".to_string(),
    }
}

/// Records a `category_click` event with the given raw reference.
pub async fn create_category_click(
    db: &DatabaseConnection,
    category_ref: &str,
) -> Result<entities::analytics_event::Model> {
    let mut input = event_input(EventType::CategoryClick);
    input.category_id = Some(category_ref.to_string());
    analytics::record_event(db, input).await
}

/// Records a `product_click` event with the given raw reference.
pub async fn create_product_click(
    db: &DatabaseConnection,
    product_ref: &str,
) -> Result<entities::analytics_event::Model> {
    let mut input = event_input(EventType::ProductClick);
    input.product_id = Some(product_ref.to_string());
    analytics::record_event(db, input).await
}

/// Creates an active admin account.
pub async fn create_test_admin(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
) -> Result<entities::account::Model> {
    auth::create_account(
        db,
        NewAccount {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            is_active: true,
            is_staff: true,
        },
    )
    .await
}

/// Creates an active account without admin privilege.
pub async fn create_test_staffless(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<entities::account::Model> {
    auth::create_account(
        db,
        NewAccount {
            username: username.to_string(),
            email: String::new(),
            password: password.to_string(),
            is_active: true,
            is_staff: false,
        },
    )
    .await
}
