//! Refund model

use serde::{Deserialize, Serialize};

/// Refund processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Pending,
    Processed,
    Failed,
}

/// A compensating transaction for a cancelled order
///
/// At most one refund exists per order; `order_id` is the idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub amount: f64,
    pub reason: String,
    pub status: RefundStatus,
    pub created_at: i64,
    pub updated_at: i64,
}
