//! Analytics business logic - Event recording and the admin summary.
//!
//! Events reference products and categories by free-text id, so the summary resolves
//! those references best-effort: anything stale or non-numeric is left out of the
//! per-entity figures without failing the request.

use crate::{
    core::{listing, validation},
    entities::{
        AnalyticsEvent, AnalyticsEventColumn, Category, EventType, Product, analytics_event,
        category, product,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{
    ActiveEnum, FromQueryResult, Order, PaginatorTrait, QueryOrder, QuerySelect, Set,
    prelude::*,
    sea_query::{Alias, Expr},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Number of entries in `most_viewed_products`.
pub const MOST_VIEWED_LIMIT: usize = 5;

/// Product ids looked up per `IN (...)` query, well below SQLite's bound-variable limit.
const RESOLVE_BATCH: usize = 500;

/// Payload for recording (or fully replacing) an event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    /// What happened
    pub event_type: EventType,
    /// Loose product reference
    #[serde(default)]
    pub product_id: Option<String>,
    /// Loose category reference
    #[serde(default)]
    pub category_id: Option<String>,
    /// Search query
    #[serde(default)]
    pub search_term: Option<String>,
    /// Client-side time of the event
    pub timestamp: DateTime<Utc>,
    /// Client session identifier
    pub session_id: String,
}

/// Partial event update. Nullable fields distinguish `null` from absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    /// New event type
    pub event_type: Option<EventType>,
    /// New product reference; `Some(None)` clears it
    #[serde(default, deserialize_with = "validation::present")]
    pub product_id: Option<Option<String>>,
    /// New category reference; `Some(None)` clears it
    #[serde(default, deserialize_with = "validation::present")]
    pub category_id: Option<Option<String>>,
    /// New search term; `Some(None)` clears it
    #[serde(default, deserialize_with = "validation::present")]
    pub search_term: Option<Option<String>>,
    /// New timestamp
    pub timestamp: Option<DateTime<Utc>>,
    /// New session identifier
    pub session_id: Option<String>,
}

impl From<EventInput> for EventPatch {
    fn from(input: EventInput) -> Self {
        Self {
            event_type: Some(input.event_type),
            product_id: Some(input.product_id),
            category_id: Some(input.category_id),
            search_term: Some(input.search_term),
            timestamp: Some(input.timestamp),
            session_id: Some(input.session_id),
        }
    }
}

/// Stores a new analytics event.
///
/// # Errors
/// Returns a validation error for a blank session id or an overlong reference, or a
/// database error.
#[instrument(skip(db, input), fields(event_type = input.event_type.as_str()))]
pub async fn record_event(
    db: &DatabaseConnection,
    input: EventInput,
) -> Result<analytics_event::Model> {
    let event = analytics_event::ActiveModel {
        event_type: Set(input.event_type),
        product_id: Set(validation::optional_text("product_id", input.product_id, Some(64))?),
        category_id: Set(validation::optional_text("category_id", input.category_id, Some(64))?),
        search_term: Set(validation::optional_text("search_term", input.search_term, Some(255))?),
        timestamp: Set(input.timestamp),
        session_id: Set(validation::required_text("session_id", &input.session_id, Some(128))?),
        ..Default::default()
    };
    let event = event.insert(db).await?;
    debug!(event_id = event.id, "Analytics event recorded");
    Ok(event)
}

/// Lists all events, newest timestamp first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_events(db: &DatabaseConnection) -> Result<Vec<analytics_event::Model>> {
    AnalyticsEvent::find()
        .order_by_desc(AnalyticsEventColumn::Timestamp)
        .order_by_desc(AnalyticsEventColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a single event.
///
/// # Errors
/// Returns `EventNotFound` if no event has this id, or a database error.
pub async fn get_event(db: &DatabaseConnection, event_id: i64) -> Result<analytics_event::Model> {
    AnalyticsEvent::find_by_id(event_id)
        .one(db)
        .await?
        .ok_or(Error::EventNotFound { id: event_id })
}

/// Applies a (partial) update to an event.
///
/// # Errors
/// Returns `EventNotFound`, a validation error, or a database error.
pub async fn update_event(
    db: &DatabaseConnection,
    event_id: i64,
    patch: EventPatch,
) -> Result<analytics_event::Model> {
    let mut event: analytics_event::ActiveModel = get_event(db, event_id).await?.into();

    if let Some(event_type) = patch.event_type {
        event.event_type = Set(event_type);
    }
    if let Some(product_id) = patch.product_id {
        event.product_id = Set(validation::optional_text("product_id", product_id, Some(64))?);
    }
    if let Some(category_id) = patch.category_id {
        event.category_id = Set(validation::optional_text("category_id", category_id, Some(64))?);
    }
    if let Some(search_term) = patch.search_term {
        event.search_term = Set(validation::optional_text("search_term", search_term, Some(255))?);
    }
    if let Some(timestamp) = patch.timestamp {
        event.timestamp = Set(timestamp);
    }
    if let Some(session_id) = patch.session_id {
        event.session_id = Set(validation::required_text("session_id", &session_id, Some(128))?);
    }

    event.update(db).await.map_err(Into::into)
}

/// Deletes an event.
///
/// # Errors
/// Returns `EventNotFound` if no event has this id, or a database error.
#[instrument(skip(db))]
pub async fn delete_event(db: &DatabaseConnection, event_id: i64) -> Result<()> {
    let result = AnalyticsEvent::delete_by_id(event_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::EventNotFound { id: event_id });
    }
    info!(event_id, "Analytics event deleted");
    Ok(())
}

/// Event counts per type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventTotals {
    /// `page_visit` events
    pub page_visits: u64,
    /// `product_click` events
    pub product_clicks: u64,
    /// `category_click` events
    pub category_clicks: u64,
    /// `search` events
    pub searches: u64,
    /// `whatsapp_contact` events
    pub whatsapp_contacts: u64,
}

impl EventTotals {
    fn add(&mut self, event_type: EventType, count: u64) {
        let slot = match event_type {
            EventType::PageVisit => &mut self.page_visits,
            EventType::ProductClick => &mut self.product_clicks,
            EventType::CategoryClick => &mut self.category_clicks,
            EventType::Search => &mut self.searches,
            EventType::WhatsappContact => &mut self.whatsapp_contacts,
        };
        *slot += count;
    }
}

/// Click count for one existing category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryClicks {
    /// Category id
    pub category_id: i64,
    /// Category name
    pub name: String,
    /// Matching `category_click` events
    pub clicks: u64,
}

/// One entry of the most-viewed ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductViews {
    /// Product id
    pub product_id: i64,
    /// Product name
    pub name: String,
    /// Current price
    pub price: f64,
    /// Matching `product_click` events
    pub count: u64,
}

/// Row counts at the time of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseOverview {
    /// Number of products
    pub total_products: u64,
    /// Number of categories
    pub total_categories: u64,
    /// Number of analytics events
    pub total_events: u64,
}

/// The admin analytics summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    /// Event counts per type
    pub totals: EventTotals,
    /// Clicks for every category, zero included
    pub category_clicks: Vec<CategoryClicks>,
    /// Top products by `product_click` events
    pub most_viewed_products: Vec<ProductViews>,
    /// Row counts
    pub database_overview: DatabaseOverview,
}

#[derive(Debug, FromQueryResult)]
struct TypeCountRow {
    event_type: String,
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct ReferenceCountRow {
    reference: String,
    clicks: i64,
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// Counts events per type. Unknown stored types are skipped.
async fn event_totals(db: &DatabaseConnection) -> Result<EventTotals> {
    let rows = AnalyticsEvent::find()
        .select_only()
        .column(AnalyticsEventColumn::EventType)
        .column_as(AnalyticsEventColumn::Id.count(), "total")
        .group_by(AnalyticsEventColumn::EventType)
        .into_model::<TypeCountRow>()
        .all(db)
        .await?;

    let mut totals = EventTotals::default();
    for row in rows {
        match EventType::try_from_value(&row.event_type) {
            Ok(event_type) => totals.add(event_type, to_count(row.total)),
            Err(_) => debug!(event_type = %row.event_type, "Skipping unknown event type"),
        }
    }
    Ok(totals)
}

/// Counts events of `event_type` per non-empty value of `column`, most frequent first.
async fn reference_counts(
    db: &DatabaseConnection,
    event_type: EventType,
    column: AnalyticsEventColumn,
) -> Result<Vec<(String, u64)>> {
    let rows = AnalyticsEvent::find()
        .select_only()
        .column_as(column, "reference")
        .column_as(AnalyticsEventColumn::Id.count(), "clicks")
        .filter(AnalyticsEventColumn::EventType.eq(event_type))
        .filter(column.is_not_null())
        .filter(column.ne(""))
        .group_by(column)
        .order_by(Expr::col(Alias::new("clicks")), Order::Desc)
        .order_by(column, Order::Asc)
        .into_model::<ReferenceCountRow>()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.reference, to_count(row.clicks)))
        .collect())
}

/// Parses a loose product reference into an id.
fn parse_reference(reference: &str) -> Option<i64> {
    reference.trim().parse().ok()
}

/// Pairs every category with its click count, keeping the given order.
fn category_clicks(
    categories: Vec<category::Model>,
    counts: &HashMap<String, u64>,
) -> Vec<CategoryClicks> {
    categories
        .into_iter()
        .map(|category| CategoryClicks {
            clicks: counts.get(&category.id.to_string()).copied().unwrap_or(0),
            category_id: category.id,
            name: category.name,
        })
        .collect()
}

/// Loads the products behind `ids`, a batch at a time. Missing ids are skipped.
async fn resolve_products(
    db: &DatabaseConnection,
    mut ids: Vec<i64>,
) -> Result<HashMap<i64, product::Model>> {
    ids.sort_unstable();
    ids.dedup();

    let mut products = HashMap::new();
    for batch in ids.chunks(RESOLVE_BATCH) {
        let found = Product::find()
            .filter(product::Column::Id.is_in(batch.iter().copied()))
            .all(db)
            .await?;
        products.extend(found.into_iter().map(|p| (p.id, p)));
    }
    debug!(references = ids.len(), resolved = products.len(), "Resolved product references");
    Ok(products)
}

/// Resolves click references to products and keeps the top `limit`.
///
/// References that don't parse or don't match a product are dropped. References
/// resolving to the same product are merged. Equal counts order by product id.
fn rank_most_viewed(
    rows: Vec<(String, u64)>,
    products: &HashMap<i64, product::Model>,
    limit: usize,
) -> Vec<ProductViews> {
    let mut merged: HashMap<i64, u64> = HashMap::new();
    for (reference, clicks) in rows {
        match parse_reference(&reference).filter(|id| products.contains_key(id)) {
            Some(id) => *merged.entry(id).or_default() += clicks,
            None => debug!(%reference, "Dropping unresolvable product reference"),
        }
    }

    let mut ranked: Vec<(i64, u64)> = merged.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .filter_map(|(id, count)| {
            products.get(&id).map(|product| ProductViews {
                product_id: id,
                name: product.name.clone(),
                price: product.price.to_f64().unwrap_or_default(),
                count,
            })
        })
        .take(limit)
        .collect()
}

/// Computes the analytics summary from the live event log.
///
/// # Errors
/// Returns an error if a database query fails.
#[instrument(skip(db))]
pub async fn summary(db: &DatabaseConnection) -> Result<AnalyticsSummary> {
    let totals = event_totals(db).await?;

    let category_counts: HashMap<String, u64> =
        reference_counts(db, EventType::CategoryClick, AnalyticsEventColumn::CategoryId)
            .await?
            .into_iter()
            .collect();
    let categories = listing::category_query(&listing::CategoryListParams::default())
        .all(db)
        .await?;
    let category_clicks = category_clicks(categories, &category_counts);

    let product_counts =
        reference_counts(db, EventType::ProductClick, AnalyticsEventColumn::ProductId).await?;
    let ids: Vec<i64> = product_counts
        .iter()
        .filter_map(|(reference, _)| parse_reference(reference))
        .collect();
    let products = resolve_products(db, ids).await?;
    let most_viewed_products = rank_most_viewed(product_counts, &products, MOST_VIEWED_LIMIT);

    let database_overview = DatabaseOverview {
        total_products: Product::find().count(db).await?,
        total_categories: Category::find().count(db).await?,
        total_events: AnalyticsEvent::find().count(db).await?,
    };

    Ok(AnalyticsSummary {
        totals,
        category_clicks,
        most_viewed_products,
        database_overview,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, NotSet};

    fn product_model(id: i64, name: &str) -> product::Model {
        product::Model {
            id,
            name: name.to_string(),
            description: "d".to_string(),
            price: Decimal::new(1250, 2),
            category_id: 1,
            images: crate::entities::ImageList::default(),
            seller_phone: "555".to_string(),
            seller_name: "Seller".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rank_most_viewed_drops_dangling_and_limits() {
        let products: HashMap<i64, product::Model> = (1..=7)
            .map(|id| (id, product_model(id, &format!("P{id}"))))
            .collect();
        let rows = vec![
            ("999".to_string(), 50),
            ("abc".to_string(), 40),
            ("3".to_string(), 9),
            ("1".to_string(), 7),
            ("2".to_string(), 7),
            ("03".to_string(), 2),
            ("4".to_string(), 5),
            ("5".to_string(), 4),
            ("6".to_string(), 3),
        ];

        let ranked = rank_most_viewed(rows, &products, MOST_VIEWED_LIMIT);
        let ids: Vec<i64> = ranked.iter().map(|p| p.product_id).collect();
        assert_eq!(ids, vec![3, 1, 2, 4, 5]);
        assert_eq!(ranked[0].count, 11);
        assert!((ranked[0].price - 12.5).abs() < f64::EPSILON);
        assert!(ranked.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_category_clicks_keeps_zero_entries() {
        let now = Utc::now();
        let categories = vec![
            category::Model {
                id: 3,
                name: "Phones".to_string(),
                description: "d".to_string(),
                image: None,
                created_at: now,
            },
            category::Model {
                id: 4,
                name: "Audio".to_string(),
                description: "d".to_string(),
                image: None,
                created_at: now,
            },
        ];
        let counts = HashMap::from([("3".to_string(), 2), ("77".to_string(), 5)]);

        let clicks = category_clicks(categories, &counts);
        assert_eq!(clicks.len(), 2);
        assert_eq!((clicks[0].category_id, clicks[0].clicks), (3, 2));
        assert_eq!((clicks[1].category_id, clicks[1].clicks), (4, 0));
    }

    #[tokio::test]
    async fn test_record_event_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut input = event_input(EventType::PageVisit);
        input.session_id = "  ".to_string();
        let result = record_event(&db, input).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let mut input = event_input(EventType::ProductClick);
        input.product_id = Some("9".repeat(65));
        let result = record_event(&db, input).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));
        Ok(())
    }

    #[tokio::test]
    async fn test_event_crud() -> Result<()> {
        let db = setup_test_db().await?;

        let mut input = event_input(EventType::Search);
        input.search_term = Some(" headphones ".to_string());
        let event = record_event(&db, input).await?;
        assert_eq!(event.search_term.as_deref(), Some("headphones"));
        assert_eq!(get_event(&db, event.id).await?, event);

        let updated = update_event(
            &db,
            event.id,
            EventPatch {
                search_term: Some(None),
                event_type: Some(EventType::PageVisit),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.event_type, EventType::PageVisit);
        assert_eq!(updated.search_term, None);
        assert_eq!(updated.session_id, event.session_id);

        delete_event(&db, event.id).await?;
        assert!(matches!(
            get_event(&db, event.id).await,
            Err(Error::EventNotFound { id: _ })
        ));
        assert!(matches!(
            delete_event(&db, event.id).await,
            Err(Error::EventNotFound { id: _ })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_events_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let base = Utc::now();

        let mut older = event_input(EventType::PageVisit);
        older.timestamp = base - chrono::Duration::hours(1);
        let older = record_event(&db, older).await?;
        let mut newer = event_input(EventType::PageVisit);
        newer.timestamp = base;
        let newer = record_event(&db, newer).await?;

        let ids: Vec<i64> = list_events(&db).await?.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_on_empty_store() -> Result<()> {
        let db = setup_test_db().await?;
        let summary = summary(&db).await?;

        assert_eq!(summary.totals, EventTotals::default());
        assert!(summary.category_clicks.is_empty());
        assert!(summary.most_viewed_products.is_empty());
        assert_eq!(summary.database_overview, DatabaseOverview::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_category_clicks_scenario() -> Result<()> {
        let db = setup_test_db().await?;
        let mut categories = Vec::new();
        for name in ["One", "Two", "Three"] {
            categories.push(create_test_category(&db, name).await?);
        }
        let third = &categories[2];
        assert_eq!(third.id, 3);

        create_category_click(&db, "3").await?;
        create_category_click(&db, "3").await?;
        create_category_click(&db, "").await?;
        record_event(&db, event_input(EventType::Search)).await?;

        let summary = summary(&db).await?;
        assert_eq!(summary.totals.searches, 1);
        assert_eq!(summary.totals.category_clicks, 3);
        assert_eq!(summary.totals.page_visits, 0);

        // Newest category first, all categories present
        let clicks: Vec<(i64, u64)> = summary
            .category_clicks
            .iter()
            .map(|c| (c.category_id, c.clicks))
            .collect();
        assert_eq!(clicks, vec![(3, 2), (2, 0), (1, 0)]);
        assert_eq!(summary.category_clicks[0].name, "Three");
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_stale_category_references_are_excluded() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Phones").await?;
        create_category_click(&db, &category.id.to_string()).await?;
        create_category_click(&db, "4242").await?;
        create_category_click(&db, "abc").await?;

        let summary = summary(&db).await?;
        assert_eq!(summary.totals.category_clicks, 3);
        let sum: u64 = summary.category_clicks.iter().map(|c| c.clicks).sum();
        assert_eq!(sum, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_most_viewed_products() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let pixel =
            create_custom_product(&db, "Pixel", Decimal::new(49_900, 2), category.id).await?;
        let speaker = create_test_product(&db, "Speaker", category.id).await?;

        let pixel_ref = pixel.id.to_string();
        let speaker_ref = speaker.id.to_string();
        for reference in [&pixel_ref, &pixel_ref, &speaker_ref, "999", "999", "999", "abc"] {
            create_product_click(&db, reference).await?;
        }

        let summary = summary(&db).await?;
        assert_eq!(summary.totals.product_clicks, 7);

        let ranked: Vec<(i64, u64)> = summary
            .most_viewed_products
            .iter()
            .map(|p| (p.product_id, p.count))
            .collect();
        assert_eq!(ranked, vec![(pixel.id, 2), (speaker.id, 1)]);
        assert_eq!(summary.most_viewed_products[0].name, "Pixel");
        assert!((summary.most_viewed_products[0].price - 499.0).abs() < 1e-9);

        assert_eq!(
            summary.database_overview,
            DatabaseOverview {
                total_products: 2,
                total_categories: 1,
                total_events: 7,
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_limits_most_viewed() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        for i in 0..7_u64 {
            let product = create_test_product(&db, &format!("P{i}"), category.id).await?;
            for _ in 0..=i {
                create_product_click(&db, &product.id.to_string()).await?;
            }
        }

        let summary = summary(&db).await?;
        assert_eq!(summary.most_viewed_products.len(), MOST_VIEWED_LIMIT);
        let counts: Vec<u64> = summary.most_viewed_products.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![7, 6, 5, 4, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_survives_many_distinct_dangling_references() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let pixel = create_test_product(&db, "Pixel", category.id).await?;
        let speaker = create_test_product(&db, "Speaker", category.id).await?;
        for reference in [pixel.id, pixel.id, speaker.id] {
            create_product_click(&db, &reference.to_string()).await?;
        }

        // More distinct references than SQLite accepts as bound variables in one query
        let dangling: Vec<analytics_event::ActiveModel> = (100_000..140_000)
            .map(|reference: i64| analytics_event::ActiveModel {
                id: NotSet,
                event_type: Set(EventType::ProductClick),
                product_id: Set(Some(reference.to_string())),
                category_id: Set(None),
                search_term: Set(None),
                timestamp: Set(chrono::Utc::now()),
                session_id: Set("crawler".to_string()),
            })
            .collect();
        for batch in dangling.chunks(2_000) {
            AnalyticsEvent::insert_many(batch.to_vec()).exec(&db).await?;
        }

        let summary = summary(&db).await?;
        assert_eq!(summary.totals.product_clicks, 40_003);
        let ranked: Vec<(i64, u64)> = summary
            .most_viewed_products
            .iter()
            .map(|p| (p.product_id, p.count))
            .collect();
        assert_eq!(ranked, vec![(pixel.id, 2), (speaker.id, 1)]);
        Ok(())
    }
}
