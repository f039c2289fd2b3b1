//! Settings Service

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use serde::{Serialize, de::DeserializeOwned};
use storefront::{
    checkout::Quote,
    delivery::{DELIVERY_SETTINGS_KEY, DeliverySettings, PICKUP_SETTINGS_KEY, PickupLocation},
};
use tracing::{info, warn};

use crate::{
    database::{Db, bounded},
    domain::settings::{
        errors::SettingsServiceError,
        repository::{PgSettingsRepository, SettingsRepository},
    },
};

#[derive(Clone)]
pub struct StoreSettingsService<R> {
    repository: Arc<R>,
    timeout: Duration,
}

/// Settings service backed by `PostgreSQL`.
pub type PgSettingsService = StoreSettingsService<PgSettingsRepository>;

impl PgSettingsService {
    #[must_use]
    pub fn new(db: Db, timeout: Duration) -> Self {
        Self::with_repository(PgSettingsRepository::new(db), timeout)
    }
}

impl<R: SettingsRepository> StoreSettingsService<R> {
    #[must_use]
    pub fn with_repository(repository: R, timeout: Duration) -> Self {
        Self {
            repository: Arc::new(repository),
            timeout,
        }
    }

    async fn read<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, SettingsServiceError> {
        let data = bounded::<_, SettingsServiceError, _>(
            self.timeout,
            self.repository.get_setting(key),
        )
        .await?;

        data.map(serde_json::from_value)
            .transpose()
            .map_err(SettingsServiceError::from)
    }

    async fn write<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), SettingsServiceError> {
        let data = serde_json::to_value(value)?;

        bounded::<_, SettingsServiceError, _>(
            self.timeout,
            self.repository.put_setting(key, data),
        )
        .await?;

        info!(key, "saved settings");

        Ok(())
    }
}

impl<R> std::fmt::Debug for StoreSettingsService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSettingsService")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R: SettingsRepository + 'static> SettingsService for StoreSettingsService<R> {
    #[tracing::instrument(name = "settings.service.delivery_settings", skip(self), err)]
    async fn delivery_settings(&self) -> Result<Option<DeliverySettings>, SettingsServiceError> {
        self.read(DELIVERY_SETTINGS_KEY).await
    }

    #[tracing::instrument(name = "settings.service.update_delivery_settings", skip(self), err)]
    async fn update_delivery_settings(
        &self,
        settings: DeliverySettings,
    ) -> Result<(), SettingsServiceError> {
        self.write(DELIVERY_SETTINGS_KEY, &settings).await
    }

    #[tracing::instrument(name = "settings.service.pickup_location", skip(self), err)]
    async fn pickup_location(&self) -> Result<Option<PickupLocation>, SettingsServiceError> {
        self.read(PICKUP_SETTINGS_KEY).await
    }

    #[tracing::instrument(name = "settings.service.update_pickup_location", skip(self), err)]
    async fn update_pickup_location(
        &self,
        location: PickupLocation,
    ) -> Result<(), SettingsServiceError> {
        self.write(PICKUP_SETTINGS_KEY, &location).await
    }

    #[tracing::instrument(
        name = "settings.service.quote_delivery",
        skip(self),
        fields(subtotal = %subtotal)
    )]
    async fn quote_delivery(&self, subtotal: Decimal) -> Quote {
        let settings = self.delivery_settings().await.unwrap_or_else(|error| {
            warn!(%error, "delivery settings unavailable, quoting free delivery");

            None
        });

        Quote::for_subtotal(subtotal, settings.as_ref())
    }
}

#[automock]
#[async_trait]
pub trait SettingsService: Send + Sync {
    /// Current delivery pricing, if configured.
    async fn delivery_settings(&self) -> Result<Option<DeliverySettings>, SettingsServiceError>;

    /// Replace the delivery pricing. Placed orders keep their totals.
    async fn update_delivery_settings(
        &self,
        settings: DeliverySettings,
    ) -> Result<(), SettingsServiceError>;

    /// Current pickup point, if configured.
    async fn pickup_location(&self) -> Result<Option<PickupLocation>, SettingsServiceError>;

    /// Replace the pickup point.
    async fn update_pickup_location(
        &self,
        location: PickupLocation,
    ) -> Result<(), SettingsServiceError>;

    /// Quote delivery for a subtotal. Unreadable settings quote free delivery.
    async fn quote_delivery(&self, subtotal: Decimal) -> Quote;
}
