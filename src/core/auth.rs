//! Auth gateway - Credential checks and the account → token association.
//!
//! Each account owns at most one opaque token, stored in `auth_tokens`. Login reuses
//! the existing token; logout deletes it. Tokens never expire on their own.

use crate::{
    config::AdminBootstrapConfig,
    entities::{Account, AccountColumn, AuthToken, AuthTokenColumn, account, auth_token},
    errors::{Error, Result},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Length of generated token keys.
pub const TOKEN_LENGTH: usize = 40;

/// Hashes a password into an argon2 PHC string.
///
/// # Errors
/// Returns `PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Checks a password against a stored hash. A malformed hash never matches.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Generates a random alphanumeric token key.
#[must_use]
pub fn generate_token_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Login payload. The identifier may come as `email` or `username`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Email or username
    #[serde(default)]
    pub email: Option<String>,
    /// Alternative field for the identifier
    #[serde(default)]
    pub username: Option<String>,
    /// Plain-text password
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    fn identifier(&self) -> Option<&str> {
        [self.email.as_deref(), self.username.as_deref()]
            .into_iter()
            .flatten()
            .find(|v| !v.is_empty())
    }
}

/// Display identity of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Email, or the username when no email is set
    pub email: String,
    /// Login name
    pub username: String,
}

impl From<&account::Model> for Identity {
    fn from(account: &account::Model) -> Self {
        Self {
            email: account.display_email().to_string(),
            username: account.username.clone(),
        }
    }
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,
    /// Email, or the username when no email is set
    pub email: String,
    /// Login name
    pub username: String,
}

fn invalid_credentials() -> Error {
    Error::unauthorized("Invalid credentials.")
}

/// Resolves an identifier and password to an active account.
///
/// The identifier is tried as a username first, then as an email.
///
/// # Errors
/// Returns `Unauthorized` if nothing matches, the password is wrong, or the account
/// is inactive.
pub async fn authenticate(
    db: &DatabaseConnection,
    identifier: &str,
    password: &str,
) -> Result<account::Model> {
    let by_username = Account::find()
        .filter(AccountColumn::Username.eq(identifier))
        .one(db)
        .await?;
    let account = match by_username {
        Some(account) if verify_password(password, &account.password_hash) => Some(account),
        _ => Account::find()
            .filter(AccountColumn::Email.eq(identifier))
            .one(db)
            .await?
            .filter(|account| verify_password(password, &account.password_hash)),
    };

    match account {
        Some(account) if account.is_active => Ok(account),
        _ => Err(invalid_credentials()),
    }
}

/// Returns the account's token, creating one if it has none.
///
/// # Errors
/// Returns a database error if the token cannot be read or stored.
pub async fn get_or_create_token(
    db: &DatabaseConnection,
    account_id: i64,
) -> Result<auth_token::Model> {
    if let Some(token) = AuthToken::find()
        .filter(AuthTokenColumn::AccountId.eq(account_id))
        .one(db)
        .await?
    {
        return Ok(token);
    }

    let token = auth_token::ActiveModel {
        key: Set(generate_token_key()),
        account_id: Set(account_id),
        created_at: Set(chrono::Utc::now()),
    };
    match token.insert(db).await {
        Ok(token) => Ok(token),
        Err(err) => {
            // A concurrent login may have created it first
            debug!(account_id, error = %err, "Token insert failed, re-reading");
            AuthToken::find()
                .filter(AuthTokenColumn::AccountId.eq(account_id))
                .one(db)
                .await?
                .ok_or_else(|| err.into())
        }
    }
}

/// Checks admin credentials and issues (or reuses) a token.
///
/// # Errors
/// - `Validation` if the identifier or password is missing
/// - `Unauthorized` for unknown accounts, wrong passwords and inactive accounts
/// - `Forbidden` if the account is valid but not an admin
#[instrument(skip(db, request))]
pub async fn login(db: &DatabaseConnection, request: &LoginRequest) -> Result<LoginResponse> {
    let (Some(identifier), Some(password)) = (
        request.identifier(),
        request.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(Error::validation("Email and password are required."));
    };

    let account = authenticate(db, identifier, password)
        .await
        .inspect_err(|_| warn!("Rejected login attempt"))?;
    if !account.is_staff {
        return Err(Error::forbidden("Admin access required."));
    }

    let token = get_or_create_token(db, account.id).await?;
    info!(account_id = account.id, "Admin logged in");

    let identity = Identity::from(&account);
    Ok(LoginResponse {
        token: token.key,
        email: identity.email,
        username: identity.username,
    })
}

/// Deletes the account's token. Succeeds even if there was none.
///
/// # Errors
/// Returns a database error if the delete fails.
#[instrument(skip(db))]
pub async fn logout(db: &DatabaseConnection, account_id: i64) -> Result<()> {
    let result = AuthToken::delete_many()
        .filter(AuthTokenColumn::AccountId.eq(account_id))
        .exec(db)
        .await?;
    info!(account_id, removed = result.rows_affected, "Logged out");
    Ok(())
}

/// Looks up the active account owning a token key.
///
/// # Errors
/// Returns a database error if a lookup fails.
pub async fn resolve_token(db: &DatabaseConnection, key: &str) -> Result<Option<account::Model>> {
    let Some(token) = AuthToken::find_by_id(key.to_string()).one(db).await? else {
        return Ok(None);
    };
    let account = Account::find_by_id(token.account_id).one(db).await?;
    Ok(account.filter(|a| a.is_active))
}

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Login name
    pub username: String,
    /// Contact email, may be empty
    pub email: String,
    /// Plain-text password, hashed before storage
    pub password: String,
    /// Whether the account can authenticate
    pub is_active: bool,
    /// Admin privilege
    pub is_staff: bool,
}

/// Creates an account with a hashed password.
///
/// # Errors
/// Returns a validation error for a blank username, or a hashing or database error.
pub async fn create_account(db: &DatabaseConnection, new: NewAccount) -> Result<account::Model> {
    let username = crate::core::validation::required_text("username", &new.username, Some(150))?;
    let account = account::ActiveModel {
        username: Set(username),
        email: Set(new.email.trim().to_string()),
        password_hash: Set(hash_password(&new.password)?),
        is_active: Set(new.is_active),
        is_staff: Set(new.is_staff),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    account.insert(db).await.map_err(Into::into)
}

/// Result of the startup admin bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No password, or neither username nor email, was configured
    Skipped,
    /// A new admin account was created
    Created,
    /// An existing account was changed; lists the changed fields
    Updated(Vec<&'static str>),
    /// The account already matched the configuration
    Unchanged,
}

fn configured(value: Option<&String>) -> Option<&str> {
    value
        .map(String::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Creates or updates the configured admin account.
///
/// The account is looked up by username when one is configured, otherwise by email.
///
/// # Errors
/// Returns a hashing or database error.
#[instrument(skip(db, config))]
pub async fn ensure_admin_account(
    db: &DatabaseConnection,
    config: &AdminBootstrapConfig,
) -> Result<BootstrapOutcome> {
    let username = configured(config.username.as_ref());
    let email = configured(config.email.as_ref());
    let Some(password) = configured(config.password.as_ref()) else {
        warn!("Skipping admin bootstrap. Set ADMIN_PASSWORD and ADMIN_USERNAME or ADMIN_EMAIL.");
        return Ok(BootstrapOutcome::Skipped);
    };
    let existing = match (username, email) {
        (Some(username), _) => {
            Account::find()
                .filter(AccountColumn::Username.eq(username))
                .one(db)
                .await?
        }
        (None, Some(email)) => {
            Account::find()
                .filter(AccountColumn::Email.eq(email))
                .one(db)
                .await?
        }
        (None, None) => {
            warn!(
                "Skipping admin bootstrap. Set ADMIN_PASSWORD and ADMIN_USERNAME or ADMIN_EMAIL."
            );
            return Ok(BootstrapOutcome::Skipped);
        }
    };

    let Some(account) = existing else {
        let login = username.or(email).unwrap_or_default();
        create_account(
            db,
            NewAccount {
                username: login.to_string(),
                email: email.unwrap_or_default().to_string(),
                password: password.to_string(),
                is_active: true,
                is_staff: true,
            },
        )
        .await?;
        info!(username = login, "Created admin user");
        return Ok(BootstrapOutcome::Created);
    };

    let mut changed = Vec::new();
    let mut active: account::ActiveModel = account.clone().into();
    if let Some(username) = username.filter(|u| *u != account.username) {
        active.username = Set(username.to_string());
        changed.push("username");
    }
    if let Some(email) = email.filter(|e| *e != account.email) {
        active.email = Set(email.to_string());
        changed.push("email");
    }
    if !account.is_staff {
        active.is_staff = Set(true);
        changed.push("is_staff");
    }
    if !account.is_active {
        active.is_active = Set(true);
        changed.push("is_active");
    }
    if config.force_password_reset {
        active.password_hash = Set(hash_password(password)?);
        changed.push("password");
    }

    if changed.is_empty() {
        info!("Admin user already up-to-date");
        return Ok(BootstrapOutcome::Unchanged);
    }
    active.update(db).await?;
    info!(fields = ?changed, "Updated admin user fields");
    Ok(BootstrapOutcome::Updated(changed))
}
