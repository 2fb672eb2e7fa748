//! HTTP surface - axum router over the core operations.
//!
//! Every route lives under `/api`. Handlers extract the caller from the bearer token,
//! check it against the capability table, then delegate to `core`.

mod analytics;
mod auth;
mod categories;
pub mod extract;
mod products;

use crate::{
    core::permissions::{self, Operation},
    errors::Result,
};
use axum::{Json, Router, routing::get, routing::post};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection pool, shared across handler clones
    pub db: Arc<DatabaseConnection>,
}

impl AppState {
    /// Wraps a database connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db: Arc::new(db) }
    }
}

async fn health() -> Result<Json<Value>> {
    permissions::authorize(Operation::Health, None)?;
    Ok(Json(json!({ "status": "ok" })))
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            get(categories::retrieve)
                .put(categories::replace)
                .patch(categories::update)
                .delete(categories::destroy),
        )
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::retrieve)
                .put(products::replace)
                .patch(products::update)
                .delete(products::destroy),
        )
        .route(
            "/analytics-events",
            get(analytics::list).post(analytics::create),
        )
        .route(
            "/analytics-events/{id}",
            get(analytics::retrieve)
                .put(analytics::replace)
                .patch(analytics::update)
                .delete(analytics::destroy),
        )
        .route("/analytics/summary", get(analytics::summary))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
