//! Orders
//!
//! An order is placed once from a cart snapshot and afterwards only its status (and the instant
//! that status last changed) is ever written.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{cart::CartItem, customers::Customer, normalize, phone::digits, uuids::TypedUuid};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Where an order is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, awaiting the shop.
    Waiting,

    /// Accepted by the shop.
    Confirmed,

    /// Handed to delivery.
    Shipped,

    /// Delivered or collected.
    Received,

    /// Refused by the shop.
    Rejected,

    /// Called off after confirmation.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Waiting,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Received,
        OrderStatus::Rejected,
        OrderStatus::Cancelled,
    ];

    /// Lowercase name, as stored.
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Waiting => "waiting",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Received => "received",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// No further transitions are expected from this status.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Received | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }

    /// Whether the lifecycle has an edge from `self` to `to`.
    pub const fn can_transition_to(self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (
                OrderStatus::Waiting,
                OrderStatus::Confirmed | OrderStatus::Rejected
            ) | (
                OrderStatus::Confirmed,
                OrderStatus::Shipped | OrderStatus::Cancelled
            ) | (OrderStatus::Shipped, OrderStatus::Received)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// An unrecognised status name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownOrderStatus(s.to_string()))
    }
}

/// How strictly status changes follow the lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any status may be set from any status.
    #[default]
    Permissive,

    /// Only lifecycle edges, or re-setting the current status, are accepted.
    Strict,
}

impl TransitionPolicy {
    /// Check a status change against this policy.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Illegal`] when a strict policy forbids the change.
    pub fn check(self, from: OrderStatus, to: OrderStatus) -> Result<(), TransitionError> {
        match self {
            TransitionPolicy::Permissive => Ok(()),
            TransitionPolicy::Strict if from == to || from.can_transition_to(to) => Ok(()),
            TransitionPolicy::Strict => Err(TransitionError::Illegal { from, to }),
        }
    }
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransitionPolicy::Permissive => "permissive",
            TransitionPolicy::Strict => "strict",
        })
    }
}

/// An unrecognised transition policy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transition policy: {0} (expected permissive or strict)")]
pub struct UnknownTransitionPolicy(pub String);

impl FromStr for TransitionPolicy {
    type Err = UnknownTransitionPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            _ => Err(UnknownTransitionPolicy(s.to_string())),
        }
    }
}

/// A refused status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The lifecycle has no edge between the statuses.
    #[error("cannot move order from {from} to {to}")]
    Illegal {
        /// Current status.
        from: OrderStatus,

        /// Requested status.
        to: OrderStatus,
    },
}

/// Everything needed to place an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Snapshot of the cart lines.
    pub items: Vec<CartItem>,

    /// Who ordered.
    pub customer: Customer,

    /// Subtotal plus delivery, fixed at placement.
    pub total: Decimal,

    /// Note for the shop.
    pub comment: Option<String>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Identifier.
    pub uuid: OrderUuid,

    /// Lines as they were in the cart at placement.
    pub items: Vec<CartItem>,

    /// Who ordered.
    pub customer: Customer,

    /// Amount charged, including delivery.
    #[serde(deserialize_with = "normalize::de::amount")]
    pub total: Decimal,

    /// Current status.
    pub status: OrderStatus,

    /// Placement instant.
    pub created_at: Timestamp,

    /// Instant of the most recent status write.
    pub last_status_change: Timestamp,

    /// Note for the shop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Order {
    /// Place a new order. It starts `waiting`, with its status changed at creation.
    pub fn place(uuid: OrderUuid, draft: NewOrder, now: Timestamp) -> Self {
        Self {
            uuid,
            items: draft.items,
            customer: draft.customer,
            total: draft.total,
            status: OrderStatus::Waiting,
            created_at: now,
            last_status_change: now,
            comment: draft.comment,
        }
    }

    /// Set the status.
    ///
    /// The status-change instant always moves, even when the status is unchanged, and never
    /// moves backwards.
    ///
    /// # Errors
    ///
    /// Returns an error when `policy` forbids the change; the order is left untouched.
    pub fn transition(
        &mut self,
        status: OrderStatus,
        now: Timestamp,
        policy: TransitionPolicy,
    ) -> Result<(), TransitionError> {
        policy.check(self.status, status)?;

        self.status = status;
        self.last_status_change = now.max(self.last_status_change);

        Ok(())
    }

    /// Number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Whether the order matches an admin search: customer name (case-insensitive), phone
    /// digits, or order id.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();

        if query.is_empty() {
            return true;
        }

        let needle = query.to_lowercase();

        if self.customer.name.to_lowercase().contains(&needle)
            || self.uuid.to_string().contains(&needle)
        {
            return true;
        }

        let query_digits = digits(query);

        !query_digits.is_empty() && digits(&self.customer.phone).contains(&query_digits)
    }
}
