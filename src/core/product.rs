//! Product business logic - Handles listing and CRUD for catalog products.
//!
//! Listing goes through [`ProductFilter`], which composes the search, category,
//! price-range and ordering parameters into one query. Every product is returned
//! together with its category's name.

use crate::{
    core::{
        listing::{ProductFilter, ProductListParams},
        validation,
    },
    entities::{Category, ImageList, Product, category, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Set, prelude::*};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// A product together with its category's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductWithCategory {
    /// The product row
    pub product: product::Model,
    /// Name of the referenced category
    pub category_name: String,
}

impl ProductWithCategory {
    fn from_pair(product: product::Model, category: Option<category::Model>) -> Self {
        Self {
            product,
            category_name: category.map(|c| c.name).unwrap_or_default(),
        }
    }
}

/// Full payload for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Unit price, accepted as a JSON string or number
    pub price: Decimal,
    /// Existing category id
    pub category_id: i64,
    /// Image references
    #[serde(default)]
    pub images: Vec<String>,
    /// Seller phone number
    pub seller_phone: String,
    /// Seller display name
    pub seller_name: String,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    /// New display name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New price
    pub price: Option<Decimal>,
    /// New category id
    pub category_id: Option<i64>,
    /// Replacement image list
    pub images: Option<Vec<String>>,
    /// New seller phone number
    pub seller_phone: Option<String>,
    /// New seller display name
    pub seller_name: Option<String>,
}

impl From<ProductInput> for ProductPatch {
    fn from(input: ProductInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            price: Some(input.price),
            category_id: Some(input.category_id),
            images: Some(input.images),
            seller_phone: Some(input.seller_phone),
            seller_name: Some(input.seller_name),
        }
    }
}

/// Looks up the category a product should point at.
///
/// An unknown id is a validation error, not a not-found: it is a bad field value.
async fn resolve_category(db: &DatabaseConnection, category_id: i64) -> Result<category::Model> {
    Category::find_by_id(category_id).one(db).await?.ok_or_else(|| {
        Error::validation(format!(
            "category_id: Invalid pk \"{category_id}\" - object does not exist."
        ))
    })
}

/// Lists products matching the given query parameters.
///
/// Malformed price bounds and unknown sort keys are ignored. A non-numeric category
/// id matches nothing.
///
/// # Errors
/// Returns an error if the database query fails.
#[instrument(skip(db))]
pub async fn list_products(
    db: &DatabaseConnection,
    params: &ProductListParams,
) -> Result<Vec<ProductWithCategory>> {
    let filter = ProductFilter::from_params(params);
    if filter.is_unmatchable() {
        debug!("Category filter cannot match any product");
        return Ok(Vec::new());
    }

    let rows = filter.to_query().all(db).await?;
    Ok(rows
        .into_iter()
        .map(|(product, category)| ProductWithCategory::from_pair(product, category))
        .collect())
}

/// Retrieves a specific product by its unique ID.
///
/// # Errors
/// Returns `ProductNotFound` if no product has this id, or a database error.
pub async fn get_product(db: &DatabaseConnection, product_id: i64) -> Result<ProductWithCategory> {
    let (product, category) = Product::find_by_id(product_id)
        .find_also_related(Category)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;
    Ok(ProductWithCategory::from_pair(product, category))
}

/// Creates a new product, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - A text field is blank or too long
/// - The price is negative, has more than 2 decimal places or more than 8 integer digits
/// - The category does not exist
/// - The database insert operation fails
#[instrument(skip(db, input), fields(name = %input.name, category_id = input.category_id))]
pub async fn create_product(
    db: &DatabaseConnection,
    input: ProductInput,
) -> Result<ProductWithCategory> {
    let name = validation::required_text("name", &input.name, Some(255))?;
    let description = validation::required_text("description", &input.description, None)?;
    let price = validation::price(input.price)?;
    let seller_phone = validation::required_text("seller_phone", &input.seller_phone, Some(32))?;
    let seller_name = validation::required_text("seller_name", &input.seller_name, Some(255))?;
    let category = resolve_category(db, input.category_id).await?;

    let product = product::ActiveModel {
        name: Set(name),
        description: Set(description),
        price: Set(price),
        category_id: Set(category.id),
        images: Set(ImageList(input.images)),
        seller_phone: Set(seller_phone),
        seller_name: Set(seller_name),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let product = product.insert(db).await?;
    info!(product_id = product.id, "Product created");

    Ok(ProductWithCategory {
        product,
        category_name: category.name,
    })
}

/// Applies a (partial) update to a product, with the same validation as creation.
///
/// # Errors
/// Returns `ProductNotFound`, a validation error, or a database error.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    patch: ProductPatch,
) -> Result<ProductWithCategory> {
    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    if let Some(name) = patch.name {
        product.name = Set(validation::required_text("name", &name, Some(255))?);
    }
    if let Some(description) = patch.description {
        product.description = Set(validation::required_text("description", &description, None)?);
    }
    if let Some(price) = patch.price {
        product.price = Set(validation::price(price)?);
    }
    if let Some(images) = patch.images {
        product.images = Set(ImageList(images));
    }
    if let Some(seller_phone) = patch.seller_phone {
        product.seller_phone = Set(validation::required_text(
            "seller_phone",
            &seller_phone,
            Some(32),
        )?);
    }
    if let Some(seller_name) = patch.seller_name {
        product.seller_name = Set(validation::required_text(
            "seller_name",
            &seller_name,
            Some(255),
        )?);
    }
    if let Some(category_id) = patch.category_id {
        product.category_id = Set(resolve_category(db, category_id).await?.id);
    }

    let product = product.update(db).await?;
    get_product(db, product.id).await
}

/// Deletes a product.
///
/// # Errors
/// Returns `ProductNotFound` if no product has this id, or a database error.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let result = Product::delete_by_id(product_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::ProductNotFound { id: product_id });
    }
    info!(product_id, "Product deleted");
    Ok(())
}
