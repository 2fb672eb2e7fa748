//! Product endpoints.

use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath, ApiQuery, Caller},
    },
    core::{
        listing::ProductListParams,
        permissions::Operation,
        product::{self, ProductInput, ProductPatch, ProductWithCategory},
    },
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Product as returned by the API.
#[derive(Debug, Serialize)]
pub struct ProductView {
    id: i64,
    name: String,
    description: String,
    /// Fixed two-decimal string, e.g. `"12.50"`
    price: String,
    category_id: i64,
    category_name: String,
    images: Vec<String>,
    seller_phone: String,
    seller_name: String,
    created_at: DateTime<Utc>,
}

fn format_price(price: Decimal) -> String {
    let mut price = price.round_dp(2);
    price.rescale(2);
    price.to_string()
}

impl From<ProductWithCategory> for ProductView {
    fn from(value: ProductWithCategory) -> Self {
        let ProductWithCategory {
            product,
            category_name,
        } = value;
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: format_price(product.price),
            category_id: product.category_id,
            category_name,
            images: product.images.0,
            seller_phone: product.seller_phone,
            seller_name: product.seller_name,
            created_at: product.created_at,
        }
    }
}

pub(super) async fn list(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<ApiQuery<ProductListParams>>,
) -> Result<Json<Vec<ProductView>>> {
    caller.authorize(Operation::ListProducts)?;
    let ApiQuery(params) = query?;
    let products = product::list_products(&state.db, &params).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

pub(super) async fn retrieve(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
) -> Result<Json<ProductView>> {
    caller.authorize(Operation::RetrieveProduct)?;
    let ApiPath(id) = path?;
    Ok(Json(product::get_product(&state.db, id).await?.into()))
}

pub(super) async fn create(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<ApiJson<ProductInput>>,
) -> Result<(StatusCode, Json<ProductView>)> {
    caller.authorize(Operation::CreateProduct)?;
    let ApiJson(input) = body?;
    let created = product::create_product(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub(super) async fn replace(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
    body: Result<ApiJson<ProductInput>>,
) -> Result<Json<ProductView>> {
    caller.authorize(Operation::UpdateProduct)?;
    let ApiPath(id) = path?;
    let ApiJson(input) = body?;
    Ok(Json(product::update_product(&state.db, id, input.into()).await?.into()))
}

pub(super) async fn update(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
    body: Result<ApiJson<ProductPatch>>,
) -> Result<Json<ProductView>> {
    caller.authorize(Operation::UpdateProduct)?;
    let ApiPath(id) = path?;
    let ApiJson(patch) = body?;
    Ok(Json(product::update_product(&state.db, id, patch).await?.into()))
}

pub(super) async fn destroy(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
) -> Result<StatusCode> {
    caller.authorize(Operation::DeleteProduct)?;
    let ApiPath(id) = path?;
    product::delete_product(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
