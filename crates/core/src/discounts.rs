//! Discounts
//!
//! A product discount is a percentage off the base price that holds until an end instant.
//! [`get_active_discount`] is the only gate deciding whether a discount applies; every
//! pricing path goes through it, so an expired discount simply reads as full price.

use jiff::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{normalize::ToInstant, products::ProductDetails};

/// Whether a discount ending at `end_date` still holds at `now`.
///
/// Absent or unreadable end dates fail closed.
pub fn is_discount_valid<T: ToInstant + ?Sized>(end_date: Option<&T>, now: Timestamp) -> bool {
    end_date
        .and_then(ToInstant::to_instant)
        .is_some_and(|end| now < end)
}

/// The discount percentage currently in force for a product, if any.
pub fn get_active_discount(product: &ProductDetails, now: Timestamp) -> Option<Decimal> {
    let percentage = product.discount_percentage?;

    if percentage <= Decimal::ZERO || !is_discount_valid(product.discount_end_date.as_ref(), now)
    {
        return None;
    }

    Some(percentage)
}

/// Apply a percentage discount to a price.
///
/// Percentages outside `(0, 100]` leave the price unchanged. No rounding is applied; see
/// [`round_for_display`].
pub fn calculate_discounted_price(original_price: Decimal, percentage: Decimal) -> Decimal {
    if percentage <= Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return original_price;
    }

    let remaining = Decimal::ONE - percentage / Decimal::ONE_HUNDRED;

    original_price
        .checked_mul(remaining)
        .unwrap_or(original_price)
}

/// Round an amount to two decimal places for display.
pub fn round_for_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A product's price at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectivePrice {
    /// The unit price to charge.
    pub price: Decimal,

    /// The base price before any discount.
    pub original_price: Decimal,

    /// The discount that produced `price`, if one is active.
    pub discount_percentage: Option<Decimal>,
}

impl EffectivePrice {
    /// Whether the price is discounted.
    pub fn is_discounted(&self) -> bool {
        self.discount_percentage.is_some()
    }
}

/// Work out what a product costs at `now`.
pub fn effective_price(product: &ProductDetails, now: Timestamp) -> EffectivePrice {
    let original_price = product.price;

    match get_active_discount(product, now) {
        Some(percentage) => EffectivePrice {
            price: calculate_discounted_price(original_price, percentage),
            original_price,
            discount_percentage: Some(percentage),
        },
        None => EffectivePrice {
            price: original_price,
            original_price,
            discount_percentage: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use testresult::TestResult;

    use crate::{fixtures::product, normalize::RawInstant};

    use super::*;

    fn day() -> SignedDuration {
        SignedDuration::from_hours(24)
    }

    fn discounted(percentage: i64, end: Option<Timestamp>) -> ProductDetails {
        let mut details = product("Lamp", 100).details;

        details.discount_percentage = Some(Decimal::from(percentage));
        details.discount_end_date = end;

        details
    }

    #[test]
    fn discount_valid_only_strictly_before_end() -> TestResult {
        let now = Timestamp::now();

        assert!(is_discount_valid(Some(&now.checked_add(day())?), now));
        assert!(!is_discount_valid(Some(&now), now));
        assert!(!is_discount_valid(Some(&now.checked_sub(day())?), now));

        Ok(())
    }

    #[test]
    fn discount_validity_fails_closed() {
        let now = Timestamp::now();

        assert!(!is_discount_valid::<Timestamp>(None, now));
        assert!(!is_discount_valid(Some("not a date"), now));
        assert!(!is_discount_valid(
            Some(&RawInstant::Text(String::new())),
            now
        ));
    }

    #[test]
    fn discount_validity_accepts_every_instant_shape() {
        let now = Timestamp::UNIX_EPOCH;

        assert!(is_discount_valid(Some("2030-01-01"), now));
        assert!(is_discount_valid(
            Some(&RawInstant::Wrapper {
                seconds: 60,
                nanoseconds: 0
            }),
            now
        ));
        assert!(is_discount_valid(Some(&RawInstant::Millis(1)), now));
    }

    #[test]
    fn active_discount_requires_open_window() -> TestResult {
        let now = Timestamp::now();

        let expired = discounted(20, Some(now.checked_sub(day())?));
        let running = discounted(20, Some(now.checked_add(day())?));

        assert_eq!(get_active_discount(&expired, now), None);
        assert_eq!(get_active_discount(&running, now), Some(Decimal::from(20)));

        Ok(())
    }

    #[test]
    fn active_discount_requires_positive_percentage() -> TestResult {
        let now = Timestamp::now();
        let tomorrow = Some(now.checked_add(day())?);

        assert_eq!(get_active_discount(&discounted(0, tomorrow), now), None);
        assert_eq!(get_active_discount(&discounted(-5, tomorrow), now), None);
        assert_eq!(get_active_discount(&discounted(20, None), now), None);

        Ok(())
    }

    #[test]
    fn discounted_price_math() {
        let hundred = Decimal::from(100);

        assert_eq!(
            calculate_discounted_price(hundred, Decimal::from(25)),
            Decimal::from(75)
        );
        assert_eq!(calculate_discounted_price(hundred, Decimal::ZERO), hundred);
        assert_eq!(
            calculate_discounted_price(hundred, Decimal::from(150)),
            hundred
        );
        assert_eq!(
            calculate_discounted_price(hundred, Decimal::from(100)),
            Decimal::ZERO
        );
    }

    #[test]
    fn discounted_price_is_not_rounded() {
        let price = calculate_discounted_price(Decimal::new(999, 2), Decimal::from(15));

        assert_eq!(price, Decimal::new(84915, 4));
        assert_eq!(round_for_display(price), Decimal::new(849, 2));
    }

    #[test]
    fn effective_price_falls_back_to_full_price_once_expired() -> TestResult {
        let now = Timestamp::now();
        let expired = discounted(50, Some(now.checked_sub(day())?));
        let running = discounted(50, Some(now.checked_add(day())?));

        let full = effective_price(&expired, now);
        let half = effective_price(&running, now);

        assert!(!full.is_discounted());
        assert_eq!(full.price, Decimal::from(100));
        assert_eq!(half.price, Decimal::from(50));
        assert_eq!(half.original_price, Decimal::from(100));
        assert_eq!(half.discount_percentage, Some(Decimal::from(50)));

        Ok(())
    }
}
