//! Analytics event entity - Raw telemetry posted by storefront clients.
//!
//! Product and category references are free text: nothing guarantees they point
//! at a live row, so anything reading them must resolve best-effort.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of interaction an event records.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A page was viewed
    #[sea_orm(string_value = "page_visit")]
    PageVisit,
    /// A product card or detail page was opened
    #[sea_orm(string_value = "product_click")]
    ProductClick,
    /// A category was opened
    #[sea_orm(string_value = "category_click")]
    CategoryClick,
    /// A search was submitted
    #[sea_orm(string_value = "search")]
    Search,
    /// The visitor tapped the seller's WhatsApp link
    #[sea_orm(string_value = "whatsapp_contact")]
    WhatsappContact,
}

impl EventType {
    /// Wire and storage name of the event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PageVisit => "page_visit",
            Self::ProductClick => "product_click",
            Self::CategoryClick => "category_click",
            Self::Search => "search",
            Self::WhatsappContact => "whatsapp_contact",
        }
    }
}

/// Analytics event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "analytics_events")]
pub struct Model {
    /// Unique identifier for the event
    #[sea_orm(primary_key)]
    pub id: i64,
    /// What happened
    pub event_type: EventType,
    /// Loose reference to a product id, may be stale or non-numeric
    #[sea_orm(column_type = "String(StringLen::N(64))", nullable)]
    pub product_id: Option<String>,
    /// Loose reference to a category id, may be stale or non-numeric
    #[sea_orm(column_type = "String(StringLen::N(64))", nullable)]
    pub category_id: Option<String>,
    /// Search query, for `search` events
    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub search_term: Option<String>,
    /// Client-supplied time of the event
    pub timestamp: DateTimeUtc,
    /// Client session identifier
    #[sea_orm(column_type = "String(StringLen::N(128))")]
    pub session_id: String,
}

/// Analytics events have no enforced relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
