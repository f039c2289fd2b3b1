//! Delivery
//!
//! Delivery pricing and the pickup point are singleton settings records. A quote is taken from
//! whatever the settings say at checkout; orders keep the total they were placed with.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize;

/// Settings key of the delivery pricing record.
pub const DELIVERY_SETTINGS_KEY: &str = "delivery";

/// Settings key of the pickup location record.
pub const PICKUP_SETTINGS_KEY: &str = "pickup";

/// Delivery pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySettings {
    /// Charged when the subtotal is under the threshold.
    #[serde(deserialize_with = "normalize::de::amount")]
    pub base_cost: Decimal,

    /// Subtotals at or above this ship free.
    #[serde(deserialize_with = "normalize::de::amount")]
    pub free_delivery_threshold: Decimal,
}

/// Where customers collect their orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupLocation {
    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,

    /// Street address.
    pub address: String,
}

/// Delivery cost for an order subtotal.
///
/// Without settings delivery is free, so a missing record never blocks checkout.
pub fn calculate_delivery_cost(settings: Option<&DeliverySettings>, subtotal: Decimal) -> Decimal {
    match settings {
        None => Decimal::ZERO,
        Some(settings) if subtotal >= settings.free_delivery_threshold => Decimal::ZERO,
        Some(settings) => settings.base_cost,
    }
}
