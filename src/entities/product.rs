//! Product entity - Represents an item listed in the catalog.
//!
//! Each product belongs to exactly one category and carries a fixed-point price
//! with two decimal places, a list of image references and seller contact details.

use sea_orm::{FromJsonQueryResult, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// Image references stored as a JSON array of strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct ImageList(pub Vec<String>);

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub name: String,
    /// Free-text description
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Unit price, at most 10 digits with 2 decimal places
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    /// ID of the category this product is listed under
    pub category_id: i64,
    /// Image references, in display order
    #[sea_orm(column_type = "Json")]
    pub images: ImageList,
    /// Seller contact phone number
    #[sea_orm(column_type = "String(StringLen::N(32))")]
    pub seller_phone: String,
    /// Seller display name
    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub seller_name: String,
    /// When the product was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Restrict"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
