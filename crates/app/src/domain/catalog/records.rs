//! Catalog Records
//!
//! Documents are stored as JSON next to their identity columns and normalized on read.

use jiff_sqlx::Timestamp as SqlxTimestamp;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{FromRow, Row, postgres::PgRow, types::Json};
use storefront::products::{Category, CategoryUuid, Product, ProductUuid};

/// A product as read from the `products` table.
#[derive(Debug, Clone)]
pub(crate) struct ProductRecord(pub(crate) Product);

/// A category as read from the `categories` table.
#[derive(Debug, Clone)]
pub(crate) struct CategoryRecord(pub(crate) Category);

fn try_get_document<T: DeserializeOwned>(row: &PgRow) -> sqlx::Result<T> {
    let Json(data) = row.try_get::<Json<Value>, _>("data")?;

    serde_json::from_value(data).map_err(|e| sqlx::Error::ColumnDecode {
        index: "data".to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(Product {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            details: try_get_document(row)?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        }))
    }
}

impl<'r> FromRow<'r, PgRow> for CategoryRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(Category {
            uuid: CategoryUuid::from_uuid(row.try_get("uuid")?),
            details: try_get_document(row)?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        }))
    }
}
