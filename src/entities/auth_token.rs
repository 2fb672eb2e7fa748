//! Auth token entity - The account → bearer token association.
//!
//! One row per account at most; the row is reused across logins and removed on logout.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Auth token database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_tokens")]
pub struct Model {
    /// Opaque token value
    #[sea_orm(primary_key, auto_increment = false, column_type = "String(StringLen::N(40))")]
    pub key: String,
    /// Owner of the token
    #[sea_orm(unique)]
    pub account_id: i64,
    /// When the token was issued
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `AuthToken` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each token belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
