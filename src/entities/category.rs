//! Category entity - Groups products in the catalog.
//!
//! A category cannot be removed while any product still references it; the
//! relation is declared `ON DELETE RESTRICT` and the delete path checks first.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Phones")
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub name: String,
    /// Free-text description
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Optional image reference (URL or data URI)
    #[sea_orm(column_type = "Text", nullable)]
    pub image: Option<String>,
    /// When the category was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category has many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
