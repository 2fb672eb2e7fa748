//! Application settings.
//!
//! Settings come from an optional TOML file (`config.toml` by default, or the path in
//! `CATALOG_CONFIG`) and are then overridden by environment variables, which are usually
//! populated from `.env`. Every field has a default so the server starts with no file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default `SQLite` database location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/catalog.sqlite?mode=rwc";

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Database settings
    pub database: DatabaseConfig,
    /// Admin account created or updated at startup
    pub admin: AdminBootstrapConfig,
}

/// HTTP server settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

/// Database settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SeaORM` connection URL
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

/// Admin bootstrap settings.
///
/// Bootstrap runs only when a password and at least one of username/email are set.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct AdminBootstrapConfig {
    /// Login name of the admin account
    pub username: Option<String>,
    /// Email of the admin account
    pub email: Option<String>,
    /// Password to set on creation (or on every start with `force_password_reset`)
    pub password: Option<String>,
    /// Reset the password of an existing account to `password`
    pub force_password_reset: bool,
}

impl AppConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    /// Returns an error if the TOML syntax is invalid or a field has the wrong type.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse config file: {e}"),
        })
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        debug!("Loading configuration from: {:?}", path_ref);
        let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
            message: format!("Failed to read config file {}: {e}", path_ref.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads the file named by `CATALOG_CONFIG` (default `config.toml`) if it exists,
    /// then applies environment overrides.
    ///
    /// # Errors
    /// Returns an error if an existing config file cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = std::env::var("CATALOG_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let mut config = if Path::new(&path).exists() {
            Self::load_file(&path)?
        } else {
            info!("No config file at {path}, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides from a key lookup, normally the process environment.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = get("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(bind_address) = get("BIND_ADDRESS") {
            self.server.bind_address = bind_address;
        }
        if let Some(username) = get("ADMIN_USERNAME") {
            self.admin.username = Some(username);
        }
        if let Some(email) = get("ADMIN_EMAIL") {
            self.admin.email = Some(email);
        }
        if let Some(password) = get("ADMIN_PASSWORD") {
            self.admin.password = Some(password);
        }
        if let Some(flag) = get("ADMIN_FORCE_PASSWORD_RESET") {
            self.admin.force_password_reset = parse_bool_flag(&flag);
        }
    }
}

/// Interprets `1`, `true`, `yes` and `on` (any case) as true.
#[must_use]
pub fn parse_bool_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
