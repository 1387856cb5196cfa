//! Payment gateway port
//!
//! The checkout saga and the refund engine talk to an abstract
//! [`PaymentGateway`]; the concrete PayMongo client is injected at startup.
//! Webhook payloads are parsed once at the boundary into [`WebhookEvent`]
//! and dispatched on the tag.

pub mod mock;
mod paymongo;
mod webhook;

pub use paymongo::PayMongoGateway;
pub use webhook::WebhookEvent;

use crate::models::PaymentStatus;
use async_trait::async_trait;
use thiserror::Error;

/// Gateway failure modes
///
/// All of them are fatal for the current saga: the coordinator runs its
/// compensations and surfaces a generic 500.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(String),
    #[error("gateway rejected the request ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("unexpected gateway response: {0}")]
    Malformed(String),
}

/// A created checkout session
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Gateway-side session/payment id
    pub payment_id: String,
    /// Hosted payment page the customer is redirected to
    pub checkout_url: String,
}

/// External payment provider operations
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session for the given amount
    ///
    /// `reference_id` is the order/rental id, carried for reconciliation.
    async fn create_session(
        &self,
        amount: f64,
        reference_id: &str,
        description: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Query the current status of a checkout session
    async fn verify(&self, session_id: &str) -> Result<PaymentStatus, GatewayError>;

    /// Refund an amount against an order
    async fn refund(&self, order_id: &str, amount: f64) -> Result<(), GatewayError>;
}

/// Convert an abstract amount to integer centavos at the gateway boundary
pub(crate) fn to_centavos(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_centavos() {
        assert_eq!(to_centavos(50000.0), 5_000_000);
        assert_eq!(to_centavos(0.5), 50);
        assert_eq!(to_centavos(99.99), 9999);
    }
}
