//! Settings service errors.

use sqlx::Error;
use thiserror::Error;
use tokio::time::error::Elapsed;

#[derive(Debug, Error)]
pub enum SettingsServiceError {
    #[error("invalid settings document")]
    InvalidData(#[from] serde_json::Error),

    #[error("backend did not respond in time")]
    Timeout,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for SettingsServiceError {
    fn from(error: Error) -> Self {
        Self::Sql(error)
    }
}

impl From<Elapsed> for SettingsServiceError {
    fn from(_: Elapsed) -> Self {
        Self::Timeout
    }
}
