//! Settings Repository

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;
use sqlx::{query, query_scalar, types::Json};

use crate::database::Db;

const GET_SETTING_SQL: &str = include_str!("sql/get_setting.sql");
const PUT_SETTING_SQL: &str = include_str!("sql/put_setting.sql");

/// Singleton settings documents, keyed by name.
#[automock]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// The document stored under `key`, if any.
    async fn get_setting(&self, key: &str) -> Result<Option<Value>, sqlx::Error>;

    /// Replace the document stored under `key`.
    async fn put_setting(&self, key: &str, data: Value) -> Result<(), sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgSettingsRepository {
    db: Db,
}

impl PgSettingsRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get_setting(&self, key: &str) -> Result<Option<Value>, sqlx::Error> {
        let data: Option<Json<Value>> = query_scalar(GET_SETTING_SQL)
            .bind(key)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(data.map(|Json(value)| value))
    }

    async fn put_setting(&self, key: &str, data: Value) -> Result<(), sqlx::Error> {
        query(PUT_SETTING_SQL)
            .bind(key)
            .bind(Json(data))
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}
