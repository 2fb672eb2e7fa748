#![allow(clippy::result_large_err)]

use catalog_api::{
    api::{self, AppState},
    config::{AppConfig, database},
    core::auth::{self, BootstrapOutcome},
    errors::Result,
};
use dotenvy::dotenv;
use std::path::Path;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Creates the parent directory of a file-backed `SQLite` database.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal: env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = AppConfig::load()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;
    info!("Successfully processed application configuration.");

    // 4. Initialize database
    ensure_sqlite_dir(&app_config.database.url)?;
    let db = database::create_connection(&app_config.database.url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Create or update the admin account
    match auth::ensure_admin_account(&db, &app_config.admin).await? {
        BootstrapOutcome::Created => info!("Admin account created."),
        BootstrapOutcome::Updated(fields) => info!(?fields, "Admin account updated."),
        BootstrapOutcome::Unchanged => info!("Admin account already up-to-date."),
        BootstrapOutcome::Skipped => warn!("No admin account configured."),
    }

    // 6. Serve
    let listener = TcpListener::bind(&app_config.server.bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", app_config.server.bind_address, e))?;
    info!("Listening on {}", app_config.server.bind_address);

    axum::serve(listener, api::router(AppState::new(db)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}
