//! Analytics event endpoints and the admin summary.

use crate::{
    api::{
        AppState,
        extract::{ApiJson, ApiPath, Caller},
    },
    core::{
        analytics::{self, AnalyticsSummary, EventInput, EventPatch},
        permissions::Operation,
    },
    entities::AnalyticsEventModel,
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};

pub(super) async fn list(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<AnalyticsEventModel>>> {
    caller.authorize(Operation::ListEvents)?;
    Ok(Json(analytics::list_events(&state.db).await?))
}

pub(super) async fn retrieve(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
) -> Result<Json<AnalyticsEventModel>> {
    caller.authorize(Operation::RetrieveEvent)?;
    let ApiPath(id) = path?;
    Ok(Json(analytics::get_event(&state.db, id).await?))
}

/// Public: storefront clients post telemetry without logging in.
pub(super) async fn create(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<ApiJson<EventInput>>,
) -> Result<(StatusCode, Json<AnalyticsEventModel>)> {
    caller.authorize(Operation::CreateEvent)?;
    let ApiJson(input) = body?;
    let event = analytics::record_event(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub(super) async fn replace(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
    body: Result<ApiJson<EventInput>>,
) -> Result<Json<AnalyticsEventModel>> {
    caller.authorize(Operation::UpdateEvent)?;
    let ApiPath(id) = path?;
    let ApiJson(input) = body?;
    Ok(Json(analytics::update_event(&state.db, id, input.into()).await?))
}

pub(super) async fn update(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
    body: Result<ApiJson<EventPatch>>,
) -> Result<Json<AnalyticsEventModel>> {
    caller.authorize(Operation::UpdateEvent)?;
    let ApiPath(id) = path?;
    let ApiJson(patch) = body?;
    Ok(Json(analytics::update_event(&state.db, id, patch).await?))
}

pub(super) async fn destroy(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<ApiPath<i64>>,
) -> Result<StatusCode> {
    caller.authorize(Operation::DeleteEvent)?;
    let ApiPath(id) = path?;
    analytics::delete_event(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn summary(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<AnalyticsSummary>> {
    caller.authorize(Operation::AnalyticsSummary)?;
    Ok(Json(analytics::summary(&state.db).await?))
}
