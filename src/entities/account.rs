//! Account entity - Back-office users who may log in.
//!
//! Only accounts with `is_staff` set hold admin privilege.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name
    #[sea_orm(unique, column_type = "String(StringLen::N(150))")]
    pub username: String,
    /// Contact email, may be empty
    #[sea_orm(column_type = "String(StringLen::N(254))")]
    pub email: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Inactive accounts cannot authenticate
    pub is_active: bool,
    /// Admin privilege
    pub is_staff: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Email if set, otherwise the username.
    #[must_use]
    pub fn display_email(&self) -> &str {
        if self.email.is_empty() {
            &self.username
        } else {
            &self.email
        }
    }
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// An account holds at most one token
    #[sea_orm(has_one = "super::auth_token::Entity")]
    AuthToken,
}

impl Related<super::auth_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthToken.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
