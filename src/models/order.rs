//! Order model and status lifecycle

use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// Transitions form a DAG enforced by [`OrderStatus::can_transition_to`]:
///
/// ```text
/// PendingPayment ──▶ Paid ──▶ Allocated ──▶ InTransit ──▶ ReadyForPickup ──▶ Completed
///        │            │           │             │
///        └────────────┴───────────┴─────────────┴──▶ Cancelled ──▶ Refunded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Allocated,
    InTransit,
    ReadyForPickup,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (PendingPayment, Paid)
                | (PendingPayment, Cancelled)
                | (Paid, Allocated)
                | (Paid, Cancelled)
                | (Allocated, InTransit)
                | (Allocated, Cancelled)
                | (InTransit, ReadyForPickup)
                | (InTransit, Cancelled)
                | (ReadyForPickup, Completed)
                | (Cancelled, Refunded)
        )
    }

    /// Whether an order in this status still holds physical inventory
    ///
    /// Used by the startup reconciliation: these orders must re-mark their
    /// units as committed so a restart does not oversell.
    pub fn holds_inventory(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid
                | OrderStatus::Allocated
                | OrderStatus::InTransit
                | OrderStatus::ReadyForPickup
        )
    }
}

/// A committed multi-item rental order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub store_id: String,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub items: Vec<OrderItem>,
    pub payment_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An item of an order, recording the allocated unit
///
/// `unit_id` and `warehouse_id` are internal allocation details. They are
/// persisted with the order but must never reach API responses; handlers
/// expose their own view structs without them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub collectible_id: String,
    pub collectible_name: String,
    pub unit_id: String,
    pub warehouse_id: String,
    pub rental_days: u32,
    pub eta_days: u32,
    pub price: f64,
}
