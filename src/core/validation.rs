//! Field checks shared by the create/update paths.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Largest accepted price, exclusive: 8 integer digits.
const PRICE_LIMIT: i64 = 100_000_000;

/// Trims `value` and rejects it if blank or longer than `max_chars`.
pub(crate) fn required_text(field: &str, value: &str, max_chars: Option<usize>) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field}: This field may not be blank.")));
    }
    check_length(field, trimmed, max_chars)?;
    Ok(trimmed.to_string())
}

/// Trims an optional value and checks its length. Blank values are kept as-is.
pub(crate) fn optional_text(
    field: &str,
    value: Option<String>,
    max_chars: Option<usize>,
) -> Result<Option<String>> {
    value
        .map(|v| {
            let trimmed = v.trim();
            check_length(field, trimmed, max_chars)?;
            Ok(trimmed.to_string())
        })
        .transpose()
}

fn check_length(field: &str, value: &str, max_chars: Option<usize>) -> Result<()> {
    match max_chars {
        Some(max) if value.chars().count() > max => Err(Error::validation(format!(
            "{field}: Ensure this field has no more than {max} characters."
        ))),
        _ => Ok(()),
    }
}

/// Accepts non-negative prices with at most 2 decimal places and 8 integer digits.
pub(crate) fn price(value: Decimal) -> Result<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::validation("price: Ensure this value is greater than or equal to 0."));
    }
    if value.normalize().scale() > 2 {
        return Err(Error::validation(
            "price: Ensure that there are no more than 2 decimal places.",
        ));
    }
    if value.trunc() >= Decimal::from(PRICE_LIMIT) {
        return Err(Error::validation(
            "price: Ensure that there are no more than 8 digits before the decimal point.",
        ));
    }
    Ok(value)
}

/// Distinguishes an explicit `null` from an absent field in partial updates.
///
/// Use with `#[serde(default, deserialize_with = "present")]` on an `Option<Option<T>>`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
