//! Cart Items

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    discounts::effective_price,
    normalize,
    products::{CategoryUuid, Product, ProductUuid},
};

/// Identity of a cart line: the product plus its selected variant, if any.
///
/// Adding, removing and updating lines all match on this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    /// Product on the line.
    pub product_uuid: ProductUuid,

    /// Selected size variant.
    pub selected_size: Option<String>,

    /// Selected colour variant.
    pub selected_color: Option<String>,
}

impl LineKey {
    /// Key for a product without variants.
    pub fn product(product_uuid: ProductUuid) -> Self {
        Self {
            product_uuid,
            selected_size: None,
            selected_color: None,
        }
    }

    /// Narrow the key to a size.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.selected_size = Some(size.into());
        self
    }

    /// Narrow the key to a colour.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.selected_color = Some(color.into());
        self
    }

    pub(crate) fn matches(&self, item: &CartItem) -> bool {
        self.product_uuid == item.product_uuid
            && self.selected_size == item.selected_size
            && self.selected_color == item.selected_color
    }
}

/// A line in the cart.
///
/// `price` is the unit price at the time the product was added, with any active discount
/// already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product on the line.
    pub product_uuid: ProductUuid,

    /// Product name when added.
    pub name: String,

    /// Effective unit price.
    #[serde(deserialize_with = "normalize::de::amount")]
    pub price: Decimal,

    /// Unit price before discount.
    #[serde(deserialize_with = "normalize::de::amount")]
    pub original_price: Decimal,

    /// Discount applied when the line was added.
    #[serde(
        default,
        deserialize_with = "normalize::de::optional_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub discount_percentage: Option<Decimal>,

    /// Display image.
    #[serde(default)]
    pub image: String,

    /// Units on the line, at least one.
    pub quantity: u32,

    /// Category of the product.
    pub category_uuid: CategoryUuid,

    /// Selected size variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,

    /// Selected colour variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
}

impl CartItem {
    /// Build a line for `quantity` units of a product, priced at `now`.
    pub fn from_product(product: &Product, quantity: u32, now: Timestamp) -> Self {
        let pricing = effective_price(&product.details, now);

        Self {
            product_uuid: product.uuid,
            name: product.details.name.clone(),
            price: pricing.price,
            original_price: pricing.original_price,
            discount_percentage: pricing.discount_percentage,
            image: product.display_image().to_string(),
            quantity,
            category_uuid: product.details.category_uuid,
            selected_size: None,
            selected_color: None,
        }
    }

    /// Select variants for this line.
    #[must_use]
    pub fn with_variant(mut self, size: Option<String>, color: Option<String>) -> Self {
        self.selected_size = size;
        self.selected_color = color;
        self
    }

    /// The identity of this line.
    pub fn key(&self) -> LineKey {
        LineKey {
            product_uuid: self.product_uuid,
            selected_size: self.selected_size.clone(),
            selected_color: self.selected_color.clone(),
        }
    }

    /// Price times quantity, saturating at [`Decimal::MAX`].
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Price times quantity, or `None` when it doesn't fit in a [`Decimal`].
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}
