//! Listing query builder.
//!
//! Turns raw query-string parameters into a parsed filter and then into a `SeaORM`
//! select. Parsing is lenient: malformed price bounds and unknown sort keys are
//! dropped instead of rejected, so a listing request never fails on its parameters.
//! Numeric bounds outside the `Decimal` range saturate rather than disappear.
//! All filters combine with AND.

use crate::entities::{Category, Product, category, product};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder, Select, SelectTwo,
    sea_query::{Expr, Func, IntoIden, LikeExpr, SimpleExpr},
};
use serde::Deserialize;

/// Query parameters accepted by the product listing.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProductListParams {
    /// Free-text search over product name, description and category name
    pub q: Option<String>,
    /// Exact category id
    pub category_id: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<String>,
    /// Inclusive upper price bound
    pub max_price: Option<String>,
    /// Sort key, see [`ProductOrdering::parse`]
    pub ordering: Option<String>,
}

/// Query parameters accepted by the category listing.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CategoryListParams {
    /// Free-text search over category name and description
    pub q: Option<String>,
}

/// Allowed product sort orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductOrdering {
    /// `price`
    PriceAsc,
    /// `-price`
    PriceDesc,
    /// `name`
    NameAsc,
    /// `-name`
    NameDesc,
    /// `created_at`
    CreatedAsc,
    /// `-created_at`, newest first
    #[default]
    CreatedDesc,
}

impl ProductOrdering {
    /// Parses a sort key. Anything outside the allow-set yields `None`.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "price" => Some(Self::PriceAsc),
            "-price" => Some(Self::PriceDesc),
            "name" => Some(Self::NameAsc),
            "-name" => Some(Self::NameDesc),
            "created_at" => Some(Self::CreatedAsc),
            "-created_at" => Some(Self::CreatedDesc),
            _ => None,
        }
    }

    const fn column_and_order(self) -> (product::Column, Order) {
        match self {
            Self::PriceAsc => (product::Column::Price, Order::Asc),
            Self::PriceDesc => (product::Column::Price, Order::Desc),
            Self::NameAsc => (product::Column::Name, Order::Asc),
            Self::NameDesc => (product::Column::Name, Order::Desc),
            Self::CreatedAsc => (product::Column::CreatedAt, Order::Asc),
            Self::CreatedDesc => (product::Column::CreatedAt, Order::Desc),
        }
    }
}

/// Category restriction parsed from the `category_id` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryScope {
    /// Only products in this category
    Id(i64),
    /// The parameter was not a valid id, so nothing can match
    Unmatchable(String),
}

/// Parsed product filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Search term, already trimmed and non-empty
    pub search: Option<String>,
    /// Category restriction
    pub category: Option<CategoryScope>,
    /// Inclusive lower bound
    pub min_price: Option<Decimal>,
    /// Inclusive upper bound
    pub max_price: Option<Decimal>,
    /// Sort order
    pub ordering: ProductOrdering,
}

impl ProductFilter {
    /// Builds a filter from raw parameters, silently dropping malformed values.
    #[must_use]
    pub fn from_params(params: &ProductListParams) -> Self {
        Self {
            search: non_empty(params.q.as_deref()).map(str::to_string),
            category: non_empty(params.category_id.as_deref()).map(|raw| {
                raw.parse::<i64>()
                    .map_or_else(|_| CategoryScope::Unmatchable(raw.to_string()), CategoryScope::Id)
            }),
            min_price: non_empty(params.min_price.as_deref()).and_then(parse_price),
            max_price: non_empty(params.max_price.as_deref()).and_then(parse_price),
            ordering: non_empty(params.ordering.as_deref())
                .and_then(ProductOrdering::parse)
                .unwrap_or_default(),
        }
    }

    /// True when the filter can be answered without querying: the result is empty.
    #[must_use]
    pub const fn is_unmatchable(&self) -> bool {
        matches!(self.category, Some(CategoryScope::Unmatchable(_)))
    }

    /// Builds the select, joined with each product's category.
    #[must_use]
    pub fn to_query(&self) -> SelectTwo<product::Entity, category::Entity> {
        let mut query = Product::find().find_also_related(Category);

        if let Some(term) = &self.search {
            query = query.filter(
                Condition::any()
                    .add(icontains(product::Entity, product::Column::Name, term))
                    .add(icontains(product::Entity, product::Column::Description, term))
                    .add(icontains(category::Entity, category::Column::Name, term)),
            );
        }
        if let Some(CategoryScope::Id(id)) = self.category {
            query = query.filter(product::Column::CategoryId.eq(id));
        }
        if let Some(min) = self.min_price {
            query = query.filter(product::Column::Price.gte(min));
        }
        if let Some(max) = self.max_price {
            query = query.filter(product::Column::Price.lte(max));
        }

        // Ties fall back to insertion order in the same direction
        let (column, order) = self.ordering.column_and_order();
        query
            .order_by(column, order.clone())
            .order_by(product::Column::Id, order)
    }
}

/// Builds the category select for the given parameters, newest first.
#[must_use]
pub fn category_query(params: &CategoryListParams) -> Select<category::Entity> {
    let mut query = Category::find();
    if let Some(term) = non_empty(params.q.as_deref()) {
        query = query.filter(
            Condition::any()
                .add(icontains(category::Entity, category::Column::Name, term))
                .add(icontains(category::Entity, category::Column::Description, term)),
        );
    }
    query
        .order_by_desc(category::Column::CreatedAt)
        .order_by_desc(category::Column::Id)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parses a price bound as a float, the way the storefront sends it.
///
/// Returns `None` for anything non-numeric or non-finite. Finite values beyond the
/// `Decimal` range clamp to `Decimal::MAX`/`Decimal::MIN`, so `min_price=1e30`
/// still excludes every product.
#[must_use]
pub fn parse_price(raw: &str) -> Option<Decimal> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(saturating_decimal)
}

fn saturating_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(if value.abs() < 1.0 {
        Decimal::ZERO
    } else if value.is_sign_positive() {
        Decimal::MAX
    } else {
        Decimal::MIN
    })
}

/// Case-insensitive substring match on `table.column`.
pub(crate) fn icontains<T, C>(table: T, column: C, term: &str) -> SimpleExpr
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    Expr::expr(Func::lower(Expr::col((table, column))))
        .like(LikeExpr::new(contains_pattern(term)).escape('\\'))
}

/// Lowercased `%term%` pattern with LIKE wildcards in `term` escaped by `\`.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use sea_orm::{QueryTrait, sea_query::SqliteQueryBuilder};

    fn params(pairs: &[(&str, &str)]) -> ProductListParams {
        let mut p = ProductListParams::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "q" => p.q = value,
                "category_id" => p.category_id = value,
                "min_price" => p.min_price = value,
                "max_price" => p.max_price = value,
                "ordering" => p.ordering = value,
                _ => unreachable!(),
            }
        }
        p
    }

    #[test]
    fn test_ordering_allow_set() {
        assert_eq!(ProductOrdering::parse("price"), Some(ProductOrdering::PriceAsc));
        assert_eq!(ProductOrdering::parse("-name"), Some(ProductOrdering::NameDesc));
        assert_eq!(ProductOrdering::parse("-created_at"), Some(ProductOrdering::CreatedDesc));
        assert_eq!(ProductOrdering::parse("seller_name"), None);
        assert_eq!(ProductOrdering::parse("price; DROP TABLE products"), None);
    }

    #[test]
    fn test_unknown_ordering_falls_back_to_newest_first() {
        let filter = ProductFilter::from_params(&params(&[("ordering", "id")]));
        assert_eq!(filter.ordering, ProductOrdering::CreatedDesc);
    }

    #[test]
    fn test_malformed_prices_are_ignored() {
        let filter = ProductFilter::from_params(&params(&[
            ("min_price", "cheap"),
            ("max_price", "nan"),
        ]));
        assert_eq!(filter.min_price, None);
        assert_eq!(filter.max_price, None);

        let filter = ProductFilter::from_params(&params(&[
            ("min_price", " 10 "),
            ("max_price", "25.5"),
        ]));
        assert_eq!(filter.min_price, Some(Decimal::from(10)));
        assert_eq!(filter.max_price, Some(Decimal::new(255, 1)));
    }

    #[test]
    fn test_out_of_range_prices_saturate() {
        assert_eq!(parse_price("1e30"), Some(Decimal::MAX));
        assert_eq!(parse_price("-1e30"), Some(Decimal::MIN));
        assert_eq!(parse_price("1e-40"), Some(Decimal::ZERO));
        assert_eq!(parse_price("1e400"), None);

        let filter = ProductFilter::from_params(&params(&[
            ("min_price", "1e30"),
            ("max_price", "-1e30"),
        ]));
        assert_eq!(filter.min_price, Some(Decimal::MAX));
        assert_eq!(filter.max_price, Some(Decimal::MIN));
    }

    #[test]
    fn test_empty_parameters_are_absent() {
        let filter = ProductFilter::from_params(&params(&[
            ("q", "  "),
            ("category_id", ""),
            ("min_price", ""),
        ]));
        assert_eq!(filter, ProductFilter::default());
    }

    #[test]
    fn test_category_scope() {
        let filter = ProductFilter::from_params(&params(&[("category_id", "3")]));
        assert_eq!(filter.category, Some(CategoryScope::Id(3)));
        assert!(!filter.is_unmatchable());

        let filter = ProductFilter::from_params(&params(&[("category_id", "abc")]));
        assert!(filter.is_unmatchable());
    }

    #[test]
    fn test_query_composes_filters() {
        let filter = ProductFilter::from_params(&params(&[
            ("q", "Phone"),
            ("category_id", "2"),
            ("min_price", "5"),
            ("ordering", "-price"),
        ]));
        let sql = filter.to_query().into_query().to_string(SqliteQueryBuilder);

        assert!(sql.contains("LOWER(\"products\".\"name\") LIKE '%phone%'"));
        assert!(sql.contains("LOWER(\"categories\".\"name\") LIKE '%phone%'"));
        assert!(sql.contains("\"products\".\"category_id\" = 2"));
        assert!(sql.contains(" AND "));
        assert!(sql.contains("ORDER BY \"products\".\"price\" DESC"));
    }

    #[test]
    fn test_search_escapes_wildcards() {
        assert_eq!(contains_pattern("Phone"), "%phone%");
        assert_eq!(contains_pattern("100%_Off"), "%100\\%\\_off%");

        let sql = category_query(&CategoryListParams {
            q: Some("case".to_string()),
        })
        .into_query()
        .to_string(SqliteQueryBuilder);
        assert!(sql.contains("LOWER(\"categories\".\"description\") LIKE '%case%'"));
        assert!(sql.contains("ESCAPE"));
    }
}
