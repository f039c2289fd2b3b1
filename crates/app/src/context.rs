//! App Context

use std::sync::Arc;

use storefront::phone::PhonePolicy;
use thiserror::Error;

use crate::{
    config::AppConfig,
    database::{self, Db},
    domain::{
        catalog::{CatalogService, PgCatalogService},
        orders::{OrdersService, PgOrdersService},
        settings::{PgSettingsService, SettingsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrations(#[source] sqlx::migrate::MigrateError),
}

#[derive(Clone)]
pub struct AppContext {
    pub orders: Arc<dyn OrdersService>,
    pub settings: Arc<dyn SettingsService>,
    pub catalog: Arc<dyn CatalogService>,
    pub phone_policy: PhonePolicy,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(&config.database_url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);
        let timeout = config.backend_timeout();

        Ok(Self {
            orders: Arc::new(PgOrdersService::new(
                db.clone(),
                config.order_transitions,
                config.phone_policy,
                timeout,
            )),
            settings: Arc::new(PgSettingsService::new(db.clone(), timeout)),
            catalog: Arc::new(PgCatalogService::new(db, timeout)),
            phone_policy: config.phone_policy,
        })
    }

    /// Connect and bring the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error when connecting or migrating fails.
    pub async fn migrate(config: &AppConfig) -> Result<(), AppInitError> {
        let pool = database::connect(&config.database_url)
            .await
            .map_err(AppInitError::Database)?;

        database::migrate(&pool)
            .await
            .map_err(AppInitError::Migrations)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("phone_policy", &self.phone_policy)
            .finish_non_exhaustive()
    }
}
