//! Orders Repository

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use mockall::automock;
use sqlx::{Postgres, query, query_as, types::Json};
use storefront::orders::{Order, OrderStatus, OrderUuid};

use crate::{database::Db, domain::orders::records::OrderRecord};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LIST_ORDERS_SQL: &str = include_str!("sql/list_orders.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("sql/update_order_status.sql");
const DELETE_ORDER_SQL: &str = include_str!("sql/delete_order.sql");

/// Order persistence.
#[automock]
#[async_trait]
pub trait OrdersRepository: Send + Sync {
    /// Store a newly placed order.
    async fn create_order(&self, order: &Order) -> Result<(), sqlx::Error>;

    /// Fetch one order, `None` when it doesn't exist.
    async fn get_order(&self, order: OrderUuid) -> Result<Option<Order>, sqlx::Error>;

    /// All orders, newest first, optionally only those in `status`.
    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, sqlx::Error>;

    /// Write the status fields. Returns the number of rows touched.
    async fn update_order_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
        last_status_change: Timestamp,
    ) -> Result<u64, sqlx::Error>;

    /// Hard-delete an order. Returns the number of rows removed.
    async fn delete_order(&self, order: OrderUuid) -> Result<u64, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgOrdersRepository {
    db: Db,
}

impl PgOrdersRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrdersRepository for PgOrdersRepository {
    async fn create_order(&self, order: &Order) -> Result<(), sqlx::Error> {
        query(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(Json(&order.items))
            .bind(Json(&order.customer))
            .bind(order.total)
            .bind(order.status.as_str())
            .bind(SqlxTimestamp::from(order.created_at))
            .bind(SqlxTimestamp::from(order.last_status_change))
            .bind(order.comment.as_deref())
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    async fn get_order(&self, order: OrderUuid) -> Result<Option<Order>, sqlx::Error> {
        let record = query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(record.map(|OrderRecord(order)| order))
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, sqlx::Error> {
        let records = query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .bind(status.map(OrderStatus::as_str))
            .fetch_all(self.db.pool())
            .await?;

        Ok(records.into_iter().map(|OrderRecord(order)| order).collect())
    }

    async fn update_order_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
        last_status_change: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .bind(SqlxTimestamp::from(last_status_change))
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn delete_order(&self, order: OrderUuid) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_ORDER_SQL)
            .bind(order.into_uuid())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
