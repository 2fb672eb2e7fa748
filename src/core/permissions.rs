//! Capability table: which privilege each operation requires.

use crate::{
    entities::account,
    errors::{Error, Result},
};

/// Privilege levels, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Privilege {
    /// Anyone, authenticated or not
    Public,
    /// Any active account
    Authenticated,
    /// Active account with `is_staff`
    Admin,
}

/// Every operation the API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /categories`
    ListCategories,
    /// `GET /categories/{id}`
    RetrieveCategory,
    /// `POST /categories`
    CreateCategory,
    /// `PUT|PATCH /categories/{id}`
    UpdateCategory,
    /// `DELETE /categories/{id}`
    DeleteCategory,
    /// `GET /products`
    ListProducts,
    /// `GET /products/{id}`
    RetrieveProduct,
    /// `POST /products`
    CreateProduct,
    /// `PUT|PATCH /products/{id}`
    UpdateProduct,
    /// `DELETE /products/{id}`
    DeleteProduct,
    /// `POST /analytics-events`
    CreateEvent,
    /// `GET /analytics-events`
    ListEvents,
    /// `GET /analytics-events/{id}`
    RetrieveEvent,
    /// `PUT|PATCH /analytics-events/{id}`
    UpdateEvent,
    /// `DELETE /analytics-events/{id}`
    DeleteEvent,
    /// `GET /analytics/summary`
    AnalyticsSummary,
    /// `POST /auth/login`
    Login,
    /// `POST /auth/logout`
    Logout,
    /// `GET /auth/me`
    Me,
    /// `GET /health`
    Health,
}

impl Operation {
    /// Privilege a caller needs to perform this operation.
    #[must_use]
    pub const fn required_privilege(self) -> Privilege {
        match self {
            Self::ListCategories
            | Self::RetrieveCategory
            | Self::ListProducts
            | Self::RetrieveProduct
            | Self::CreateEvent
            | Self::Login
            | Self::Health => Privilege::Public,
            Self::Logout => Privilege::Authenticated,
            Self::CreateCategory
            | Self::UpdateCategory
            | Self::DeleteCategory
            | Self::CreateProduct
            | Self::UpdateProduct
            | Self::DeleteProduct
            | Self::ListEvents
            | Self::RetrieveEvent
            | Self::UpdateEvent
            | Self::DeleteEvent
            | Self::AnalyticsSummary
            | Self::Me => Privilege::Admin,
        }
    }
}

/// Privilege held by a caller.
#[must_use]
pub fn privilege_of(caller: Option<&account::Model>) -> Privilege {
    match caller {
        None => Privilege::Public,
        Some(account) if account.is_staff => Privilege::Admin,
        Some(_) => Privilege::Authenticated,
    }
}

/// Checks that `caller` may perform `operation`.
///
/// # Errors
/// Returns `Unauthorized` for anonymous callers on guarded operations and `Forbidden`
/// for authenticated callers lacking the privilege.
pub fn authorize(operation: Operation, caller: Option<&account::Model>) -> Result<()> {
    let required = operation.required_privilege();
    let held = privilege_of(caller);
    if held >= required {
        return Ok(());
    }
    if caller.is_none() {
        Err(Error::unauthorized("Authentication credentials were not provided."))
    } else {
        Err(Error::forbidden("You do not have permission to perform this action."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(is_staff: bool) -> account::Model {
        account::Model {
            id: 1,
            username: "someone".to_string(),
            email: String::new(),
            password_hash: String::new(),
            is_active: true,
            is_staff,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_public_operations() {
        for op in [
            Operation::ListProducts,
            Operation::RetrieveCategory,
            Operation::CreateEvent,
            Operation::Login,
            Operation::Health,
        ] {
            assert!(authorize(op, None).is_ok(), "{op:?}");
        }
    }

    #[test]
    fn test_admin_operations() {
        let staff = account(true);
        let clerk = account(false);

        for op in [
            Operation::CreateProduct,
            Operation::DeleteCategory,
            Operation::ListEvents,
            Operation::AnalyticsSummary,
            Operation::Me,
        ] {
            assert!(authorize(op, Some(&staff)).is_ok());
            assert!(matches!(authorize(op, None), Err(Error::Unauthorized { message: _ })));
            assert!(matches!(
                authorize(op, Some(&clerk)),
                Err(Error::Forbidden { message: _ })
            ));
        }
    }

    #[test]
    fn test_logout_needs_any_account() {
        assert!(authorize(Operation::Logout, Some(&account(false))).is_ok());
        assert!(matches!(
            authorize(Operation::Logout, None),
            Err(Error::Unauthorized { message: _ })
        ));
    }
}
