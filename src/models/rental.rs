//! Legacy single-item rental model
//!
//! Equivalent to a single-item order; retained for backward compatibility
//! with the original checkout path.

use serde::{Deserialize, Serialize};

/// Available payment options on the legacy path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Gcash,
    Grabpay,
    Bpi,
    Ubp,
}

/// Current status of a rental payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Customer contact information attached to a legacy rental
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

/// A single-item rental transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rental {
    pub id: String,
    pub collectible_id: String,
    pub collectible_name: String,
    pub store_id: String,
    pub warehouse_id: String,
    pub customer: Customer,
    /// Rental duration in days
    pub duration: u32,
    pub daily_rate: f64,
    pub total_fee: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_id: String,
    pub payment_url: String,
    /// Delivery estimate in days (warehouse distance)
    pub eta: u32,
    pub created_at: i64,
    pub updated_at: i64,
}
