//! Orders Data

use storefront::orders::OrderStatus;

/// Admin listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Only orders in this status.
    pub status: Option<OrderStatus>,

    /// Free-text match on customer name, phone digits or order id.
    pub search: Option<String>,
}

/// Result of a best-effort operation over many orders.
///
/// Each id is handled independently; failures don't undo the successes.
#[derive(Debug)]
pub struct BulkOutcome<Id, E> {
    /// Ids the operation was applied to.
    pub succeeded: Vec<Id>,

    /// Ids it failed for, with the reason.
    pub failed: Vec<(Id, E)>,
}

impl<Id, E> BulkOutcome<Id, E> {
    /// Split per-id results into successes and failures, keeping input order.
    pub fn collect(results: impl IntoIterator<Item = (Id, Result<(), E>)>) -> Self {
        let mut outcome = Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };

        for (id, result) in results {
            match result {
                Ok(()) => outcome.succeeded.push(id),
                Err(error) => outcome.failed.push((id, error)),
            }
        }

        outcome
    }

    /// Whether every id succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
