//! Database connection management

use std::time::Duration;

use sqlx::{PgPool, migrate::MigrateError};
use tokio::time::{error::Elapsed, timeout};

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Apply the bundled schema migrations.
///
/// # Errors
///
/// Returns an error when a migration fails or the applied history doesn't match.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Run a backend call, giving up after `limit`.
///
/// Service errors absorb both the elapsed deadline and the backend error.
pub(crate) async fn bounded<T, E, F>(limit: Duration, call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, sqlx::Error>>,
    E: From<Elapsed> + From<sqlx::Error>,
{
    Ok(timeout(limit, call).await??)
}

#[cfg(test)]
mod tests {
    use crate::domain::orders::OrdersServiceError;

    use super::*;

    #[tokio::test]
    async fn slow_calls_time_out() {
        let result: Result<(), OrdersServiceError> = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;

            Ok(())
        })
        .await;

        assert!(
            matches!(result, Err(OrdersServiceError::Timeout)),
            "expected Timeout, got {result:?}"
        );
    }

    #[tokio::test]
    async fn backend_errors_pass_through() {
        let result: Result<(), OrdersServiceError> =
            bounded(Duration::from_secs(1), async { Err(sqlx::Error::RowNotFound) }).await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
