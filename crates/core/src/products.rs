//! Products

use std::cmp::Ordering;

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{normalize, uuids::TypedUuid};

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Category UUID
pub type CategoryUuid = TypedUuid<Category>;

/// The editable body of a product document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    /// Display name.
    pub name: String,

    /// Long description.
    #[serde(default)]
    pub description: String,

    /// Base (undiscounted) unit price.
    #[serde(deserialize_with = "normalize::de::amount")]
    pub price: Decimal,

    /// Percentage off the base price, 0 to 100.
    #[serde(default, deserialize_with = "normalize::de::optional_amount")]
    pub discount_percentage: Option<Decimal>,

    /// The discount applies strictly before this instant.
    #[serde(default, deserialize_with = "normalize::de::optional_instant")]
    pub discount_end_date: Option<Timestamp>,

    /// Owning category.
    pub category_uuid: CategoryUuid,

    /// Gallery images, first one is the display image.
    #[serde(default)]
    pub images: Vec<String>,

    /// Legacy single image, used when `images` is empty.
    #[serde(default)]
    pub image: Option<String>,

    /// Shown on the landing page.
    #[serde(default)]
    pub featured: bool,

    /// Available to order.
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,

    /// Manual sort position.
    #[serde(default)]
    pub order: Option<i64>,
}

fn in_stock_default() -> bool {
    true
}

/// Why a product document was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    /// The gallery is empty.
    #[error("At least one image is required")]
    MissingImage,
}

impl ProductDetails {
    /// Check the document before it is saved, and point `image` at the first gallery image.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::MissingImage`] when `images` is empty.
    pub fn prepare_for_save(mut self) -> Result<Self, ProductError> {
        let first = self.images.first().ok_or(ProductError::MissingImage)?;

        self.image = Some(first.clone());

        Ok(self)
    }
}

/// Product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Identifier.
    pub uuid: ProductUuid,

    /// Document body.
    #[serde(flatten)]
    pub details: ProductDetails,

    /// Creation instant.
    pub created_at: Timestamp,
}

impl Product {
    /// The image shown for this product in lists and cart lines.
    pub fn display_image(&self) -> &str {
        self.details
            .images
            .first()
            .or(self.details.image.as_ref())
            .map_or("", String::as_str)
    }
}

/// Order products for display: manually ordered products first by `order`, then the rest by
/// creation time.
pub fn sort_products(products: &mut [Product]) {
    products.sort_by(|a, b| match (a.details.order, b.details.order) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    });
}

/// The editable body of a category document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetails {
    /// Display name.
    pub name: String,

    /// Long description.
    #[serde(default)]
    pub description: String,

    /// Cover image.
    #[serde(default)]
    pub image: Option<String>,

    /// Parent category, if this is a subcategory.
    #[serde(default)]
    pub parent_uuid: Option<CategoryUuid>,
}

/// Category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Identifier.
    pub uuid: CategoryUuid,

    /// Document body.
    #[serde(flatten)]
    pub details: CategoryDetails,

    /// Creation instant.
    pub created_at: Timestamp,
}
