//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod analytics_event;
pub mod auth_token;
pub mod category;
pub mod product;

// Re-export specific types to avoid conflicts
pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use analytics_event::{
    Column as AnalyticsEventColumn, Entity as AnalyticsEvent, EventType,
    Model as AnalyticsEventModel,
};
pub use auth_token::{Column as AuthTokenColumn, Entity as AuthToken, Model as AuthTokenModel};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use product::{Column as ProductColumn, Entity as Product, ImageList, Model as ProductModel};
