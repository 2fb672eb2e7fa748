/// Database connection and schema management
pub mod database;

/// Application settings loaded from config.toml and the environment
pub mod settings;

pub use settings::{AdminBootstrapConfig, AppConfig, DatabaseConfig, ServerConfig};
