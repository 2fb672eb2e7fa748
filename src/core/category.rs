//! Category business logic - Handles listing and CRUD for categories.
//!
//! Listings carry a product count per category, computed with a grouped count over
//! products rather than stored. Deleting a category is refused while products still
//! reference it.

use crate::{
    core::{
        listing::{self, CategoryListParams},
        validation,
    },
    entities::{Category, Product, category, product},
    errors::{Error, Result},
};
use sea_orm::{
    FromQueryResult, PaginatorTrait, QuerySelect, Set, TransactionTrait, prelude::*,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, instrument};

/// A category together with the number of products listed under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryWithCount {
    /// The category row
    pub category: category::Model,
    /// Products currently referencing the category
    pub product_count: u64,
}

/// Full payload for creating or replacing a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Optional image reference
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    /// New display name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New image reference; `Some(None)` clears it
    #[serde(default, deserialize_with = "validation::present")]
    pub image: Option<Option<String>>,
}

impl From<CategoryInput> for CategoryPatch {
    fn from(input: CategoryInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            image: Some(input.image),
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CategoryCountRow {
    category_id: i64,
    product_count: i64,
}

/// Counts products per category for the given category ids.
async fn product_counts<C: ConnectionTrait>(db: &C, ids: Vec<i64>) -> Result<HashMap<i64, u64>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = Product::find()
        .select_only()
        .column(product::Column::CategoryId)
        .column_as(product::Column::Id.count(), "product_count")
        .filter(product::Column::CategoryId.is_in(ids))
        .group_by(product::Column::CategoryId)
        .into_model::<CategoryCountRow>()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.category_id, u64::try_from(row.product_count).unwrap_or_default()))
        .collect())
}

/// Lists categories, newest first, optionally filtered by a case-insensitive search
/// over name and description.
///
/// # Errors
/// Returns an error if a database query fails.
#[instrument(skip(db))]
pub async fn list_categories(
    db: &DatabaseConnection,
    params: &CategoryListParams,
) -> Result<Vec<CategoryWithCount>> {
    let categories = listing::category_query(params).all(db).await?;
    let counts = product_counts(db, categories.iter().map(|c| c.id).collect()).await?;

    Ok(categories
        .into_iter()
        .map(|category| CategoryWithCount {
            product_count: counts.get(&category.id).copied().unwrap_or(0),
            category,
        })
        .collect())
}

/// Retrieves a single category with its product count.
///
/// # Errors
/// Returns `CategoryNotFound` if no category has this id, or a database error.
pub async fn get_category(db: &DatabaseConnection, category_id: i64) -> Result<CategoryWithCount> {
    let category = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;
    let product_count = Product::find()
        .filter(product::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;

    Ok(CategoryWithCount {
        category,
        product_count,
    })
}

/// Creates a category after validating its fields.
///
/// # Errors
/// Returns a validation error for a blank or overlong name or a blank description,
/// or a database error if the insert fails.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_category(
    db: &DatabaseConnection,
    input: CategoryInput,
) -> Result<category::Model> {
    let category = category::ActiveModel {
        name: Set(validation::required_text("name", &input.name, Some(255))?),
        description: Set(validation::required_text("description", &input.description, None)?),
        image: Set(validation::optional_text("image", input.image, None)?),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let category = category.insert(db).await?;
    info!(category_id = category.id, "Category created");
    Ok(category)
}

/// Applies a (partial) update to a category.
///
/// # Errors
/// Returns `CategoryNotFound`, a validation error, or a database error.
pub async fn update_category(
    db: &DatabaseConnection,
    category_id: i64,
    patch: CategoryPatch,
) -> Result<category::Model> {
    let mut category: category::ActiveModel = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?
        .into();

    if let Some(name) = patch.name {
        category.name = Set(validation::required_text("name", &name, Some(255))?);
    }
    if let Some(description) = patch.description {
        category.description = Set(validation::required_text("description", &description, None)?);
    }
    if let Some(image) = patch.image {
        category.image = Set(validation::optional_text("image", image, None)?);
    }

    category.update(db).await.map_err(Into::into)
}

/// Deletes a category that no product references.
///
/// The check and the delete run in one transaction. If products exist, nothing
/// changes and `CategoryInUse` is returned.
///
/// # Errors
/// Returns `CategoryNotFound`, `CategoryInUse`, or a database error.
#[instrument(skip(db))]
pub async fn delete_category(db: &DatabaseConnection, category_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let category = Category::find_by_id(category_id)
        .one(&txn)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    let product_count = Product::find()
        .filter(product::Column::CategoryId.eq(category_id))
        .count(&txn)
        .await?;
    if product_count > 0 {
        return Err(Error::CategoryInUse {
            id: category_id,
            product_count,
        });
    }

    category.delete(&txn).await?;
    txn.commit().await?;

    info!(category_id, "Category deleted");
    Ok(())
}
