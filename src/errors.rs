//! Unified error types and result handling.
//!
//! Every fallible operation in the crate returns [`Result`]. The HTTP layer turns an
//! [`Error`] into a response through its [`IntoResponse`] impl, so handlers can use `?`
//! all the way down to the database.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A query or statement against the store failed.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// The request payload had the wrong shape or failed a field check.
    #[error("{message}")]
    Validation {
        /// Human-readable reason, returned to the caller
        message: String,
    },

    /// No category with this id.
    #[error("Category not found: {id}")]
    CategoryNotFound {
        /// Requested id
        id: i64,
    },

    /// No product with this id.
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Requested id
        id: i64,
    },

    /// No analytics event with this id.
    #[error("Analytics event not found: {id}")]
    EventNotFound {
        /// Requested id
        id: i64,
    },

    /// Referential protection: the category still has products.
    #[error("Cannot delete category with linked products.")]
    CategoryInUse {
        /// Category that was asked to be deleted
        id: i64,
        /// Number of products still pointing at it
        product_count: u64,
    },

    /// Caller is not authenticated, or the credentials are wrong.
    #[error("{message}")]
    Unauthorized {
        /// Reason returned to the caller
        message: String,
    },

    /// Caller is authenticated but lacks the required privilege.
    #[error("{message}")]
    Forbidden {
        /// Reason returned to the caller
        message: String,
    },

    /// Password hashing failed.
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// I/O failure (binding the listener, reading config).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Unauthorized`] with the given message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Forbidden`] with the given message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// HTTP status this error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::CategoryInUse { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::CategoryNotFound { .. }
            | Self::ProductNotFound { .. }
            | Self::EventNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Config { .. } | Self::PasswordHash(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(value.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(value: JsonRejection) -> Self {
        Self::validation(value.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(value: PathRejection) -> Self {
        Self::validation(value.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(value: QueryRejection) -> Self {
        Self::validation(value.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details to clients
        let detail = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
