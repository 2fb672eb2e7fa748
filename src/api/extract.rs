//! Request extractors shared by the handlers.

use crate::{
    api::AppState,
    core::{
        auth,
        permissions::{self, Operation},
    },
    entities::account,
    errors::{Error, Result},
};
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{HeaderValue, header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

/// Authorization schemes accepted in front of a token key.
const SCHEMES: [&str; 2] = ["token", "bearer"];

/// JSON body whose rejections are reported as [`Error::Validation`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Path parameters whose rejections are reported as [`Error::Validation`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// Query string whose rejections are reported as [`Error::Validation`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

/// The account behind the request's bearer token, if any.
///
/// No `Authorization` header (or one with another scheme) yields an anonymous
/// caller. A token header that is malformed, unknown or belongs to an inactive
/// account rejects the request with 401.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<account::Model>);

impl Caller {
    /// Checks the caller against the capability table.
    ///
    /// # Errors
    /// `Unauthorized` or `Forbidden`, see [`permissions::authorize`].
    pub fn authorize(&self, operation: Operation) -> Result<()> {
        permissions::authorize(operation, self.0.as_ref())
    }

    /// Like [`Caller::authorize`] but also hands back the account.
    ///
    /// # Errors
    /// `Unauthorized` or `Forbidden`, see [`permissions::authorize`].
    pub fn require(&self, operation: Operation) -> Result<&account::Model> {
        self.authorize(operation)?;
        self.0
            .as_ref()
            .ok_or_else(|| Error::unauthorized("Authentication credentials were not provided."))
    }
}

/// Extracts the token key from an `Authorization` header.
///
/// Returns `Ok(None)` when the header uses a scheme other than `Token`/`Bearer`.
fn token_key(header: &HeaderValue) -> Result<Option<&str>> {
    let value = header
        .to_str()
        .map_err(|_| {
            Error::unauthorized(
                "Invalid token header. Token string should not contain invalid characters.",
            )
        })?;
    let mut parts = value.split_whitespace();

    let Some(scheme) = parts.next() else {
        return Ok(None);
    };
    if !SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s)) {
        return Ok(None);
    }

    match (parts.next(), parts.next()) {
        (None, _) => Err(Error::unauthorized(
            "Invalid token header. No credentials provided.",
        )),
        (Some(_), Some(_)) => Err(Error::unauthorized(
            "Invalid token header. Token string should not contain spaces.",
        )),
        (Some(key), None) => Ok(Some(key)),
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(None));
        };
        let Some(key) = token_key(header)? else {
            return Ok(Self(None));
        };

        match auth::resolve_token(&state.db, key).await? {
            Some(account) => Ok(Self(Some(account))),
            None => {
                debug!("Rejected unknown or inactive token");
                Err(Error::unauthorized("Invalid token."))
            }
        }
    }
}
