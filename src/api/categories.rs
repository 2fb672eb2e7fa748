//! Category endpoints.

use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath, ApiQuery, Caller},
    },
    core::{
        category::{self, CategoryInput, CategoryPatch, CategoryWithCount},
        listing::CategoryListParams,
        permissions::Operation,
    },
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Category as returned by the API.
#[derive(Debug, Serialize)]
pub struct CategoryView {
    id: i64,
    name: String,
    description: String,
    image: Option<String>,
    product_count: u64,
    created_at: DateTime<Utc>,
}

impl From<CategoryWithCount> for CategoryView {
    fn from(value: CategoryWithCount) -> Self {
        let CategoryWithCount {
            category,
            product_count,
        } = value;
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            image: category.image,
            product_count,
            created_at: category.created_at,
        }
    }
}

pub(super) async fn list(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<ApiQuery<CategoryListParams>>,
) -> Result<Json<Vec<CategoryView>>> {
    caller.authorize(Operation::ListCategories)?;
    let ApiQuery(params) = query?;
    let categories = category::list_categories(&state.db, &params).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

pub(super) async fn retrieve(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
) -> Result<Json<CategoryView>> {
    caller.authorize(Operation::RetrieveCategory)?;
    let ApiPath(id) = path?;
    Ok(Json(category::get_category(&state.db, id).await?.into()))
}

pub(super) async fn create(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<ApiJson<CategoryInput>>,
) -> Result<(StatusCode, Json<CategoryView>)> {
    caller.authorize(Operation::CreateCategory)?;
    let ApiJson(input) = body?;
    let category = category::create_category(&state.db, input).await?;
    let view = CategoryWithCount {
        category,
        product_count: 0,
    };
    Ok((StatusCode::CREATED, Json(view.into())))
}

pub(super) async fn replace(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
    body: Result<ApiJson<CategoryInput>>,
) -> Result<Json<CategoryView>> {
    caller.authorize(Operation::UpdateCategory)?;
    let ApiPath(id) = path?;
    let ApiJson(input) = body?;
    apply(&state, id, input.into()).await
}

pub(super) async fn update(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
    body: Result<ApiJson<CategoryPatch>>,
) -> Result<Json<CategoryView>> {
    caller.authorize(Operation::UpdateCategory)?;
    let ApiPath(id) = path?;
    let ApiJson(patch) = body?;
    apply(&state, id, patch).await
}

async fn apply(state: &AppState, id: i64, patch: CategoryPatch) -> Result<Json<CategoryView>> {
    category::update_category(&state.db, id, patch).await?;
    Ok(Json(category::get_category(&state.db, id).await?.into()))
}

pub(super) async fn destroy(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
) -> Result<StatusCode> {
    caller.authorize(Operation::DeleteCategory)?;
    let ApiPath(id) = path?;
    category::delete_category(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
