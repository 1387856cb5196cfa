//! Shopping cart model
//!
//! A cart is pure intent: it never reserves inventory. Allocation happens at
//! checkout.

use serde::{Deserialize, Serialize};

/// Cart lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartStatus {
    Active,
    CheckedOut,
    Abandoned,
}

/// A user's shopping cart
///
/// At most one `Active` cart exists per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub status: CartStatus,
    pub items: Vec<CartItem>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Cart {
    /// Create a new empty active cart for a user
    pub fn new_active(user_id: impl Into<String>) -> Self {
        let now = crate::util::now_millis();
        Self {
            id: crate::util::new_id(),
            user_id: user_id.into(),
            status: CartStatus::Active,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// An item in the cart: desired quantity, not a reservation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub collectible_id: String,
    pub store_id: String,
    pub rental_days: u32,
    pub quantity: u32,
}
