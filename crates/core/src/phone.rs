//! Phone numbers
//!
//! Contact numbers are validated against a locale policy. Validation returns a reason rather
//! than raising, so a caller can render it next to the field and block submission.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Locale rules for a customer's mobile number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhonePolicy {
    /// 11 digits, `01` prefix, third digit one of 0, 1, 2 or 5.
    #[default]
    Egyptian,

    /// 9 digits starting with `9`.
    Croatian,
}

impl PhonePolicy {
    /// The calling code used when formatting numbers for display.
    pub fn country_code(self) -> &'static str {
        match self {
            PhonePolicy::Egyptian => "+20",
            PhonePolicy::Croatian => "+385",
        }
    }

    fn expected_digits(self) -> usize {
        match self {
            PhonePolicy::Egyptian => 11,
            PhonePolicy::Croatian => 9,
        }
    }
}

impl fmt::Display for PhonePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhonePolicy::Egyptian => f.write_str("egyptian"),
            PhonePolicy::Croatian => f.write_str("croatian"),
        }
    }
}

/// Unknown phone policy name.
#[derive(Debug, Error)]
#[error("unknown phone policy: {0}")]
pub struct UnknownPhonePolicy(String);

impl FromStr for PhonePolicy {
    type Err = UnknownPhonePolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "egyptian" | "eg" => Ok(PhonePolicy::Egyptian),
            "croatian" | "hr" => Ok(PhonePolicy::Croatian),
            other => Err(UnknownPhonePolicy(other.to_string())),
        }
    }
}

/// Why a phone number was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    /// Nothing was entered.
    #[error("Phone number is required")]
    Missing,

    /// Wrong number of digits.
    #[error("Phone number must consist of {0} digits")]
    Length(usize),

    /// Doesn't start with the required prefix.
    #[error("Phone number must start with {0}")]
    Prefix(&'static str),

    /// The operator digit after `01` isn't one of 0, 1, 2 or 5.
    #[error("Phone number must start with 010, 011, 012 or 015")]
    Operator,
}

/// Keep only the ASCII digits of a raw input.
pub fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Validate a raw phone input against a policy.
///
/// # Errors
///
/// Returns the first rule the number breaks.
pub fn validate_phone(policy: PhonePolicy, raw: &str) -> Result<(), PhoneError> {
    if raw.is_empty() {
        return Err(PhoneError::Missing);
    }

    let cleaned = digits(raw);

    if cleaned.len() != policy.expected_digits() {
        return Err(PhoneError::Length(policy.expected_digits()));
    }

    match policy {
        PhonePolicy::Egyptian => {
            if !cleaned.starts_with("01") {
                return Err(PhoneError::Prefix("01"));
            }

            if !matches!(cleaned.chars().nth(2), Some('0' | '1' | '2' | '5')) {
                return Err(PhoneError::Operator);
            }
        }
        PhonePolicy::Croatian => {
            if !cleaned.starts_with('9') {
                return Err(PhoneError::Prefix("9"));
            }
        }
    }

    Ok(())
}

/// The reason a phone input is refused, or `None` when it's acceptable.
pub fn phone_error_message(policy: PhonePolicy, raw: &str) -> Option<String> {
    validate_phone(policy, raw).err().map(|error| error.to_string())
}

/// Render a phone number for display, prefixed with `country_code`.
///
/// Inputs that don't have the policy's digit count come back untouched. The result is for
/// presentation only and is never stored.
pub fn format_phone_number(policy: PhonePolicy, raw: &str, country_code: &str) -> String {
    let cleaned = digits(raw);

    if cleaned.len() != policy.expected_digits() {
        return raw.to_string();
    }

    // digits are ASCII, so byte offsets are char offsets
    let groups: Option<[&str; 3]> = match policy {
        PhonePolicy::Croatian => cleaned
            .get(0..3)
            .zip(cleaned.get(3..6))
            .zip(cleaned.get(6..))
            .map(|((a, b), c)| [a, b, c]),
        PhonePolicy::Egyptian => cleaned
            .get(1..4)
            .zip(cleaned.get(4..7))
            .zip(cleaned.get(7..))
            .map(|((a, b), c)| [a, b, c]),
    };

    match groups {
        Some([a, b, c]) => format!("{country_code} {a} {b} {c}"),
        None => raw.to_string(),
    }
}
