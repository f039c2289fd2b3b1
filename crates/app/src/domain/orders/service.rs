//! Orders Service

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::future::join_all;
use jiff::Timestamp;
use mockall::automock;
use storefront::{
    customers::validate_customer,
    orders::{NewOrder, Order, OrderStatus, OrderUuid, TransitionPolicy},
    phone::PhonePolicy,
};
use tracing::{Span, info, warn};

use crate::{
    database::{Db, bounded},
    domain::orders::{
        data::{BulkOutcome, OrderFilter},
        errors::OrdersServiceError,
        repository::{OrdersRepository, PgOrdersRepository},
    },
};

/// Outcome of a bulk order operation.
pub type OrdersBulkOutcome = BulkOutcome<OrderUuid, OrdersServiceError>;

#[derive(Clone)]
pub struct StoreOrdersService<R> {
    repository: Arc<R>,
    policy: TransitionPolicy,
    phone_policy: PhonePolicy,
    timeout: Duration,
}

/// Orders service backed by `PostgreSQL`.
pub type PgOrdersService = StoreOrdersService<PgOrdersRepository>;

impl PgOrdersService {
    #[must_use]
    pub fn new(
        db: Db,
        policy: TransitionPolicy,
        phone_policy: PhonePolicy,
        timeout: Duration,
    ) -> Self {
        Self::with_repository(PgOrdersRepository::new(db), policy, phone_policy, timeout)
    }
}

impl<R: OrdersRepository> StoreOrdersService<R> {
    #[must_use]
    pub fn with_repository(
        repository: R,
        policy: TransitionPolicy,
        phone_policy: PhonePolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            policy,
            phone_policy,
            timeout,
        }
    }
}

impl<R> std::fmt::Debug for StoreOrdersService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreOrdersService")
            .field("policy", &self.policy)
            .field("phone_policy", &self.phone_policy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R: OrdersRepository + 'static> OrdersService for StoreOrdersService<R> {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(
            order_uuid = tracing::field::Empty,
            item_count = order.items.len(),
            total = %order.total
        ),
        err
    )]
    async fn create_order(
        &self,
        order: NewOrder,
        point_in_time: Timestamp,
    ) -> Result<Order, OrdersServiceError> {
        if order.items.is_empty() {
            return Err(OrdersServiceError::EmptyOrder);
        }

        validate_customer(self.phone_policy, &order.customer)?;

        let order = Order::place(OrderUuid::new(), order, point_in_time);

        Span::current().record("order_uuid", tracing::field::display(order.uuid));

        bounded::<_, OrdersServiceError, _>(self.timeout, self.repository.create_order(&order))
            .await?;

        info!(order_uuid = %order.uuid, "created order");

        Ok(order)
    }

    #[tracing::instrument(name = "orders.service.get_order", skip(self), fields(order_uuid = %order), err)]
    async fn get_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        bounded::<_, OrdersServiceError, _>(self.timeout, self.repository.get_order(order))
            .await?
            .ok_or(OrdersServiceError::NotFound)
    }

    #[tracing::instrument(
        name = "orders.service.list_orders",
        skip(self, filter),
        fields(status = ?filter.status, order_count = tracing::field::Empty),
        err
    )]
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, OrdersServiceError> {
        let mut orders = bounded::<_, OrdersServiceError, _>(
            self.timeout,
            self.repository.list_orders(filter.status),
        )
        .await?;

        if let Some(search) = filter.search.as_deref() {
            orders.retain(|order| order.matches_search(search));
        }

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Span::current().record("order_count", orders.len());

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.update_order_status",
        skip(self),
        fields(order_uuid = %order, status = %status),
        err
    )]
    async fn update_order_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
        point_in_time: Timestamp,
    ) -> Result<Order, OrdersServiceError> {
        let mut current = self.get_order(order).await?;
        let previous = current.status;

        current.transition(status, point_in_time, self.policy)?;

        let rows_affected = bounded::<_, OrdersServiceError, _>(
            self.timeout,
            self.repository
                .update_order_status(order, current.status, current.last_status_change),
        )
        .await?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::NotFound);
        }

        info!(%previous, %status, "updated order status");

        Ok(current)
    }

    #[tracing::instrument(name = "orders.service.delete_order", skip(self), fields(order_uuid = %order), err)]
    async fn delete_order(&self, order: OrderUuid) -> Result<(), OrdersServiceError> {
        let rows_affected = bounded::<_, OrdersServiceError, _>(
            self.timeout,
            self.repository.delete_order(order),
        )
        .await?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::NotFound);
        }

        info!("deleted order");

        Ok(())
    }

    #[tracing::instrument(
        name = "orders.service.bulk_update_status",
        skip(self, orders),
        fields(order_count = orders.len(), status = %status, failed = tracing::field::Empty)
    )]
    async fn bulk_update_status(
        &self,
        orders: Vec<OrderUuid>,
        status: OrderStatus,
        point_in_time: Timestamp,
    ) -> OrdersBulkOutcome {
        let updates = orders.iter().map(|&order| async move {
            let result = self
                .update_order_status(order, status, point_in_time)
                .await
                .map(|_| ());

            (order, result)
        });

        let outcome = BulkOutcome::collect(join_all(updates).await);

        record_failures(&outcome);

        outcome
    }

    #[tracing::instrument(
        name = "orders.service.bulk_delete",
        skip(self, orders),
        fields(order_count = orders.len(), failed = tracing::field::Empty)
    )]
    async fn bulk_delete(&self, orders: Vec<OrderUuid>) -> OrdersBulkOutcome {
        let deletions = orders
            .iter()
            .map(|&order| async move { (order, self.delete_order(order).await) });

        let outcome = BulkOutcome::collect(join_all(deletions).await);

        record_failures(&outcome);

        outcome
    }
}

fn record_failures(outcome: &OrdersBulkOutcome) {
    Span::current().record("failed", outcome.failed.len());

    for (order, error) in &outcome.failed {
        warn!(order_uuid = %order, %error, "bulk order operation failed");
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Place an order from a checkout draft. It starts out `waiting`.
    ///
    /// Drafts without items or with invalid customer details are refused.
    async fn create_order(
        &self,
        order: NewOrder,
        point_in_time: Timestamp,
    ) -> Result<Order, OrdersServiceError>;

    /// Retrieve a single order.
    async fn get_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Orders matching the filter, newest first.
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, OrdersServiceError>;

    /// Set an order's status, moving its status-change instant forward.
    async fn update_order_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
        point_in_time: Timestamp,
    ) -> Result<Order, OrdersServiceError>;

    /// Permanently delete an order.
    async fn delete_order(&self, order: OrderUuid) -> Result<(), OrdersServiceError>;

    /// Set the status on many orders concurrently, best effort.
    async fn bulk_update_status(
        &self,
        orders: Vec<OrderUuid>,
        status: OrderStatus,
        point_in_time: Timestamp,
    ) -> OrdersBulkOutcome;

    /// Delete many orders concurrently, best effort.
    async fn bulk_delete(&self, orders: Vec<OrderUuid>) -> OrdersBulkOutcome;
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use mockall::predicate::eq;
    use rust_decimal::Decimal;
    use storefront::{
        cart::CartItem,
        customers::{Customer, CustomerError},
        orders::TransitionError,
        products::{CategoryUuid, ProductUuid},
    };
    use testresult::TestResult;

    use crate::domain::orders::repository::MockOrdersRepository;

    use super::*;

    fn draft() -> NewOrder {
        NewOrder {
            items: vec![CartItem {
                product_uuid: ProductUuid::new(),
                name: "Kettle".to_string(),
                price: Decimal::from(250),
                original_price: Decimal::from(250),
                discount_percentage: None,
                image: String::new(),
                quantity: 2,
                category_uuid: CategoryUuid::new(),
                selected_size: None,
                selected_color: None,
            }],
            customer: Customer {
                name: "Mona Adel".to_string(),
                phone: "01012345678".to_string(),
                comment: None,
            },
            total: Decimal::from(530),
            comment: None,
        }
    }

    fn placed(at: Timestamp) -> Order {
        Order::place(OrderUuid::new(), draft(), at)
    }

    fn service(repository: MockOrdersRepository, policy: TransitionPolicy) -> impl OrdersService {
        StoreOrdersService::with_repository(
            repository,
            policy,
            PhonePolicy::Egyptian,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn create_order_starts_waiting_and_is_stored() -> TestResult {
        let mut repository = MockOrdersRepository::new();

        repository
            .expect_create_order()
            .withf(|order| order.status == OrderStatus::Waiting && order.total == Decimal::from(530))
            .times(1)
            .returning(|_| Ok(()));

        let now = Timestamp::now();
        let order = service(repository, TransitionPolicy::Permissive)
            .create_order(draft(), now)
            .await?;

        assert_eq!(order.created_at, now);
        assert_eq!(order.last_status_change, now);

        Ok(())
    }

    #[tokio::test]
    async fn create_order_without_items_is_refused() {
        let mut repository = MockOrdersRepository::new();

        repository.expect_create_order().never();

        let mut order = draft();

        order.items.clear();

        let result = service(repository, TransitionPolicy::Permissive)
            .create_order(order, Timestamp::now())
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::EmptyOrder)),
            "expected EmptyOrder, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_order_with_invalid_customer_is_refused() {
        let mut repository = MockOrdersRepository::new();

        repository.expect_create_order().never();

        let mut order = draft();

        order.customer.name = "  ".to_string();
        order.customer.phone = "abc".to_string();

        let result = service(repository, TransitionPolicy::Permissive)
            .create_order(order, Timestamp::now())
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::InvalidCustomer(CustomerError::MissingName))
            ),
            "expected InvalidCustomer, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_order_checks_phone_against_configured_policy() {
        let mut repository = MockOrdersRepository::new();

        repository.expect_create_order().never();

        let result = StoreOrdersService::with_repository(
            repository,
            TransitionPolicy::Permissive,
            PhonePolicy::Croatian,
            Duration::from_secs(5),
        )
        .create_order(draft(), Timestamp::now())
        .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::InvalidCustomer(CustomerError::Phone(_)))
            ),
            "expected an invalid phone, got {result:?}"
        );
    }

    #[tokio::test]
    async fn get_order_missing_is_not_found() {
        let mut repository = MockOrdersRepository::new();

        repository.expect_get_order().returning(|_| Ok(None));

        let result = service(repository, TransitionPolicy::Permissive)
            .get_order(OrderUuid::new())
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn list_orders_filters_by_search_newest_first() -> TestResult {
        let base = Timestamp::now();
        let older = placed(base);
        let newer = placed(base.checked_add(SignedDuration::from_mins(1))?);
        let mut stranger = placed(base.checked_add(SignedDuration::from_mins(2))?);

        stranger.customer.name = "Karim".to_string();
        stranger.customer.phone = "01598765432".to_string();

        let rows = vec![older.clone(), stranger, newer.clone()];
        let mut repository = MockOrdersRepository::new();

        repository
            .expect_list_orders()
            .with(eq(Some(OrderStatus::Waiting)))
            .returning(move |_| Ok(rows.clone()));

        let orders = service(repository, TransitionPolicy::Permissive)
            .list_orders(OrderFilter {
                status: Some(OrderStatus::Waiting),
                search: Some("mona".to_string()),
            })
            .await?;

        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        assert_eq!(uuids, vec![newer.uuid, older.uuid]);

        Ok(())
    }

    #[tokio::test]
    async fn update_status_refresh_moves_timestamp_forward() -> TestResult {
        let placed_at = Timestamp::now();
        let order = placed(placed_at);
        let uuid = order.uuid;
        let later = placed_at.checked_add(SignedDuration::from_mins(3))?;
        let mut repository = MockOrdersRepository::new();

        repository
            .expect_get_order()
            .returning(move |_| Ok(Some(order.clone())));

        repository
            .expect_update_order_status()
            .with(eq(uuid), eq(OrderStatus::Waiting), eq(later))
            .times(1)
            .returning(|_, _, _| Ok(1));

        let updated = service(repository, TransitionPolicy::Strict)
            .update_order_status(uuid, OrderStatus::Waiting, later)
            .await?;

        assert_eq!(updated.last_status_change, later);

        Ok(())
    }

    #[tokio::test]
    async fn strict_policy_refuses_skipping_confirmation() {
        let order = placed(Timestamp::now());
        let uuid = order.uuid;
        let mut repository = MockOrdersRepository::new();

        repository
            .expect_get_order()
            .returning(move |_| Ok(Some(order.clone())));

        repository.expect_update_order_status().never();

        let result = service(repository, TransitionPolicy::Strict)
            .update_order_status(uuid, OrderStatus::Shipped, Timestamp::now())
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Transition(TransitionError::Illegal { .. }))
            ),
            "expected Transition error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn delete_order_missing_is_not_found() {
        let mut repository = MockOrdersRepository::new();

        repository.expect_delete_order().returning(|_| Ok(0));

        let result = service(repository, TransitionPolicy::Permissive)
            .delete_order(OrderUuid::new())
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn bulk_update_reports_partial_failure() {
        let now = Timestamp::now();
        let first = placed(now);
        let second = placed(now);
        let missing = OrderUuid::new();
        let known = [first.clone(), second.clone()];
        let mut repository = MockOrdersRepository::new();

        repository.expect_get_order().returning(move |uuid| {
            Ok(known.iter().find(|order| order.uuid == uuid).cloned())
        });

        repository
            .expect_update_order_status()
            .times(2)
            .returning(|_, _, _| Ok(1));

        let outcome = service(repository, TransitionPolicy::Permissive)
            .bulk_update_status(
                vec![first.uuid, missing, second.uuid],
                OrderStatus::Confirmed,
                now,
            )
            .await;

        assert_eq!(outcome.succeeded, vec![first.uuid, second.uuid]);
        assert_eq!(outcome.failed.len(), 1);
        assert!(
            matches!(outcome.failed.first(), Some((uuid, OrdersServiceError::NotFound)) if *uuid == missing),
            "expected the missing order to fail with NotFound"
        );
    }

    #[tokio::test]
    async fn bulk_delete_keeps_going_after_errors() {
        let gone = OrderUuid::new();
        let broken = OrderUuid::new();
        let mut repository = MockOrdersRepository::new();

        repository.expect_delete_order().returning(move |uuid| {
            if uuid == broken {
                Err(sqlx::Error::PoolTimedOut)
            } else {
                Ok(1)
            }
        });

        let outcome = service(repository, TransitionPolicy::Permissive)
            .bulk_delete(vec![broken, gone])
            .await;

        assert_eq!(outcome.succeeded, vec![gone]);
        assert!(!outcome.is_complete());
    }
}
