//! Catalog service errors.

use sqlx::Error;
use storefront::products::ProductError;
use thiserror::Error;
use tokio::time::error::Elapsed;

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("product not found")]
    ProductNotFound,

    #[error("category not found")]
    CategoryNotFound,

    #[error("category still has {products} products and {subcategories} subcategories")]
    CategoryInUse { products: u64, subcategories: u64 },

    #[error("parent category not found")]
    ParentNotFound,

    #[error("a category cannot be its own parent")]
    InvalidParent,

    #[error(transparent)]
    InvalidProduct(#[from] ProductError),

    #[error("invalid catalog document")]
    InvalidData,

    #[error("backend did not respond in time")]
    Timeout,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CatalogServiceError {
    fn from(error: Error) -> Self {
        match error {
            Error::ColumnDecode { .. } | Error::Decode(_) => Self::InvalidData,
            error => Self::Sql(error),
        }
    }
}

impl From<Elapsed> for CatalogServiceError {
    fn from(_: Elapsed) -> Self {
        Self::Timeout
    }
}
