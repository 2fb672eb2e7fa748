//! Core business logic - framework-agnostic catalog, analytics and auth operations.
//!
//! Nothing in here knows about HTTP; the `api` module maps requests onto these
//! functions and their errors onto responses.

pub mod analytics;
pub mod auth;
pub mod category;
pub mod listing;
pub mod permissions;
pub mod product;
pub(crate) mod validation;
