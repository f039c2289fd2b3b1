//! Order Records

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Row, postgres::PgRow, types::Json};
use storefront::{
    cart::CartItem,
    customers::Customer,
    orders::{Order, OrderStatus, OrderUuid},
};

/// An order as read from the `orders` table.
#[derive(Debug, Clone)]
pub(crate) struct OrderRecord(pub(crate) Order);

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        let created_at = row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff();

        let last_status_change = row
            .try_get::<Option<SqlxTimestamp>, _>("last_status_change")?
            .map_or(created_at, SqlxTimestamp::to_jiff);

        Ok(Self(Order {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            items: row.try_get::<Json<Vec<CartItem>>, _>("items")?.0,
            customer: row.try_get::<Json<Customer>, _>("customer")?.0,
            total: row.try_get::<Decimal, _>("total")?,
            status,
            created_at,
            last_status_change,
            comment: row.try_get("comment")?,
        }))
    }
}
