//! Login, logout and identity endpoints.

use crate::{
    api::{
        AppState,
        extract::{ApiJson, Caller},
    },
    core::{
        auth::{self, Identity, LoginRequest, LoginResponse},
        permissions::{self, Operation},
    },
    errors::Result,
};
use axum::{Json, extract::State, http::StatusCode};

/// Ignores any `Authorization` header, so login is checked as an anonymous caller.
pub(super) async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    permissions::authorize(Operation::Login, None)?;
    Ok(Json(auth::login(&state.db, &request).await?))
}

pub(super) async fn logout(State(state): State<AppState>, caller: Caller) -> Result<StatusCode> {
    let account = caller.require(Operation::Logout)?;
    auth::logout(&state.db, account.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn me(caller: Caller) -> Result<Json<Identity>> {
    let account = caller.require(Operation::Me)?;
    Ok(Json(Identity::from(account)))
}
