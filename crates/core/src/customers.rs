//! Customers

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::phone::{PhoneError, PhonePolicy, validate_phone};

/// Contact details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Full name.
    pub name: String,

    /// Phone number as entered.
    pub phone: String,

    /// Free-text note for the shop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Customer {
    /// The comment, if it has any content.
    pub fn comment(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|comment| !comment.is_empty())
    }
}

/// Why customer details were refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomerError {
    /// The name is blank.
    #[error("Name is required")]
    MissingName,

    /// The phone number breaks the locale policy.
    #[error(transparent)]
    Phone(#[from] PhoneError),
}

/// Validate customer details.
///
/// # Errors
///
/// Returns the first problem found, name before phone.
pub fn validate_customer(policy: PhonePolicy, customer: &Customer) -> Result<(), CustomerError> {
    if customer.name.trim().is_empty() {
        return Err(CustomerError::MissingName);
    }

    validate_phone(policy, &customer.phone)?;

    Ok(())
}

/// The reason customer details are refused, or `None` when they're acceptable.
pub fn customer_error_message(policy: PhonePolicy, customer: &Customer) -> Option<String> {
    validate_customer(policy, customer)
        .err()
        .map(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use crate::fixtures::customer;

    use super::*;

    #[test]
    fn valid_customer_has_no_message() {
        assert_eq!(
            customer_error_message(PhonePolicy::Egyptian, &customer()),
            None
        );
    }

    #[test]
    fn blank_name_is_reported_before_phone() {
        let details = Customer {
            name: "   ".to_string(),
            phone: String::new(),
            comment: None,
        };

        assert_eq!(
            customer_error_message(PhonePolicy::Egyptian, &details).as_deref(),
            Some("Name is required")
        );
    }

    #[test]
    fn phone_problems_surface_with_phone_message() {
        let mut details = customer();
        details.phone = "02012345678".to_string();

        assert_eq!(
            customer_error_message(PhonePolicy::Egyptian, &details).as_deref(),
            Some("Phone number must start with 01")
        );
    }

    #[test]
    fn blank_comment_reads_as_none() {
        let mut details = customer();

        details.comment = Some("  ".to_string());
        assert_eq!(details.comment(), None);

        details.comment = Some(" ring twice ".to_string());
        assert_eq!(details.comment(), Some("ring twice"));
    }
}
