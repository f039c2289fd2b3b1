//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use storefront::{customers::CustomerError, orders::TransitionError};
use thiserror::Error;
use tokio::time::error::Elapsed;

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order already exists")]
    AlreadyExists,

    #[error("order not found")]
    NotFound,

    #[error("invalid data")]
    InvalidData,

    #[error("order has no items")]
    EmptyOrder,

    #[error("invalid customer: {0}")]
    InvalidCustomer(#[from] CustomerError),

    #[error("backend did not respond in time")]
    Timeout,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        if matches!(error, Error::ColumnDecode { .. } | Error::Decode(_)) {
            return Self::InvalidData;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::NotNullViolation | ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<Elapsed> for OrdersServiceError {
    fn from(_: Elapsed) -> Self {
        Self::Timeout
    }
}
