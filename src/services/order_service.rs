//! Order lifecycle
//!
//! Cancellation eligibility and execution, plus reconciliation of gateway
//! outcomes (webhooks and redirect handlers) with order/rental state and
//! unit inventory.

use crate::allocation::AllocationManager;
use crate::db::Repository;
use crate::error::{AppError, AppResult};
use crate::models::{Order, OrderStatus, PaymentStatus, RefundStatus, Rental};
use crate::payment::{PaymentGateway, WebhookEvent};
use crate::util::{now_millis, round_money};
use serde::Serialize;
use std::sync::Arc;

use super::RefundService;

/// Outcome of a cancellation eligibility check
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationEligibility {
    pub can_cancel: bool,
    /// Fraction of the order total to refund (0.0 ..= 1.0)
    pub refund_fraction: f64,
    /// Whether allocated units go back to the pool
    pub release_units: bool,
    pub reason: &'static str,
}

/// Check whether an order in the given status may be cancelled
///
/// | Status | Cancel | Refund | Release units |
/// |---|---|---|---|
/// | PendingPayment | yes | 0 | no (sweeper reclaims) |
/// | Paid, Allocated | yes | 100% | yes |
/// | InTransit | yes | 50% | no |
/// | ReadyForPickup, Completed | no | — | — |
/// | Cancelled, Refunded | no | — | — |
pub fn check_cancellation_eligibility(status: OrderStatus) -> CancellationEligibility {
    match status {
        OrderStatus::PendingPayment => CancellationEligibility {
            can_cancel: true,
            refund_fraction: 0.0,
            release_units: false,
            reason: "Payment not completed",
        },
        OrderStatus::Paid | OrderStatus::Allocated => CancellationEligibility {
            can_cancel: true,
            refund_fraction: 1.0,
            release_units: true,
            reason: "Full refund - order not shipped",
        },
        OrderStatus::InTransit => CancellationEligibility {
            can_cancel: true,
            refund_fraction: 0.5,
            release_units: false,
            reason: "Partial refund (50%) - order in transit",
        },
        OrderStatus::ReadyForPickup | OrderStatus::Completed => CancellationEligibility {
            can_cancel: false,
            refund_fraction: 0.0,
            release_units: false,
            reason: "Cannot cancel delivered or completed orders",
        },
        OrderStatus::Cancelled | OrderStatus::Refunded => CancellationEligibility {
            can_cancel: false,
            refund_fraction: 0.0,
            release_units: false,
            reason: "Order already cancelled or refunded",
        },
    }
}

/// Result of a cancellation, as returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct CancellationOutcome {
    pub order_id: String,
    pub status: OrderStatus,
    pub refund_amount: f64,
    pub refund_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_status: Option<RefundStatus>,
}

/// Order status transitions and payment reconciliation
pub struct OrderService {
    repo: Arc<dyn Repository>,
    allocator: Arc<AllocationManager>,
    gateway: Arc<dyn PaymentGateway>,
    refunds: Arc<RefundService>,
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn Repository>,
        allocator: Arc<AllocationManager>,
        gateway: Arc<dyn PaymentGateway>,
        refunds: Arc<RefundService>,
    ) -> Self {
        Self {
            repo,
            allocator,
            gateway,
            refunds,
        }
    }

    /// Cancel an order, releasing units and creating a refund as the
    /// eligibility table dictates
    ///
    /// Calling again on an already cancelled order returns the stored
    /// refund outcome unchanged, so clients can safely retry.
    pub async fn cancel_order(&self, order: Order) -> AppResult<CancellationOutcome> {
        let eligibility = check_cancellation_eligibility(order.status);

        if !eligibility.can_cancel {
            // Retried cancellation: surface the recorded outcome instead of
            // refusing, keeping the endpoint idempotent
            if matches!(order.status, OrderStatus::Cancelled | OrderStatus::Refunded) {
                if let Some(refund) = self.refunds.get_refund_by_order(&order.id).await? {
                    return Ok(CancellationOutcome {
                        order_id: order.id,
                        status: order.status,
                        refund_amount: refund.amount,
                        refund_reason: refund.reason.clone(),
                        refund_id: Some(refund.id),
                        refund_status: Some(refund.status),
                    });
                }
            }
            return Err(AppError::not_cancellable(eligibility.reason));
        }

        if eligibility.release_units {
            for item in &order.items {
                if let Err(e) = self.allocator.release_unit(
                    &item.collectible_id,
                    &item.warehouse_id,
                    Some(&order.id),
                ) {
                    // Tolerated: the unit may already be back in the pool
                    tracing::warn!(
                        unit_id = %item.unit_id,
                        error = %e,
                        "Failed to release unit during cancellation"
                    );
                }
            }
        }

        let mut updated = self
            .repo
            .update_order_status(&order.id, OrderStatus::Cancelled)
            .await?;
        tracing::info!(order_id = %order.id, "Order cancelled");

        let refund_amount = round_money(order.total_amount * eligibility.refund_fraction);
        let mut refund_id = None;
        let mut refund_status = None;

        if refund_amount > 0.0 {
            match self
                .refunds
                .create_refund(&order.id, refund_amount, eligibility.reason)
                .await
            {
                Ok(refund) => {
                    refund_id = Some(refund.id.clone());
                    refund_status = Some(refund.status);
                    if refund.status == RefundStatus::Processed {
                        updated = self
                            .repo
                            .update_order_status(&order.id, OrderStatus::Refunded)
                            .await?;
                    }
                }
                Err(e) => {
                    // Cancellation stands even when the refund fails; the
                    // refund record is persisted as Failed for follow-up
                    tracing::error!(order_id = %order.id, error = %e, "Refund creation failed");
                }
            }
        }

        Ok(CancellationOutcome {
            order_id: order.id,
            status: updated.status,
            refund_amount,
            refund_reason: eligibility.reason.to_string(),
            refund_id,
            refund_status,
        })
    }

    // ==================== Payment reconciliation ====================

    /// Apply a parsed webhook event
    ///
    /// Errors are logged, never surfaced: the webhook endpoint always
    /// answers 200 and the gateway retries on its own schedule.
    pub async fn handle_webhook(&self, event: WebhookEvent) {
        match event {
            WebhookEvent::PaymentPaid(session_id) => {
                if let Err(e) = self.reconcile_paid(&session_id).await {
                    tracing::error!(session_id, error = %e, "Webhook paid reconciliation failed");
                }
            }
            WebhookEvent::SessionExpired(session_id) => {
                if let Err(e) = self.reconcile_expired(&session_id).await {
                    tracing::error!(session_id, error = %e, "Webhook expiry reconciliation failed");
                }
            }
            WebhookEvent::Other(Some(session_id)) => {
                // Unknown event type: fall back to verifying the session
                match self.gateway.verify(&session_id).await {
                    Ok(PaymentStatus::Completed) => {
                        if let Err(e) = self.reconcile_paid(&session_id).await {
                            tracing::error!(session_id, error = %e, "Webhook verify reconciliation failed");
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(session_id, error = %e, "Webhook fallback verification failed");
                    }
                }
            }
            WebhookEvent::Other(None) => {
                tracing::debug!("Ignoring webhook event without session id");
            }
        }
    }

    async fn reconcile_paid(&self, payment_id: &str) -> AppResult<()> {
        if let Some(rental) = self.repo.find_rental_by_payment(payment_id).await? {
            self.complete_payment_for_rental(rental).await?;
        }
        if let Some(order) = self.repo.find_order_by_payment(payment_id).await? {
            self.complete_payment_for_order(&order).await?;
        }
        Ok(())
    }

    async fn reconcile_expired(&self, payment_id: &str) -> AppResult<()> {
        if let Some(rental) = self.repo.find_rental_by_payment(payment_id).await? {
            if rental.payment_status == PaymentStatus::Pending {
                self.fail_payment_for_rental(rental).await?;
            }
        }
        if let Some(order) = self.repo.find_order_by_payment(payment_id).await? {
            if order.status == OrderStatus::PendingPayment {
                self.fail_payment_for_order(&order).await?;
            }
        }
        Ok(())
    }

    /// Payment succeeded: commit the rental's reservation
    pub async fn complete_payment_for_rental(&self, mut rental: Rental) -> AppResult<Rental> {
        rental.payment_status = PaymentStatus::Completed;
        rental.updated_at = now_millis();
        self.repo.update_rental(rental.clone()).await?;
        self.allocator.confirm_for_reservation(&rental.id);
        tracing::info!(rental_id = %rental.id, "Payment completed for rental");
        Ok(rental)
    }

    /// Payment failed or expired: release the rental's unit
    pub async fn fail_payment_for_rental(&self, mut rental: Rental) -> AppResult<Rental> {
        if let Err(e) = self.allocator.release_unit(
            &rental.collectible_id,
            &rental.warehouse_id,
            Some(&rental.id),
        ) {
            // The sweeper may have reclaimed the unit already
            tracing::warn!(rental_id = %rental.id, error = %e, "Unit release on failed payment");
        }
        rental.payment_status = PaymentStatus::Failed;
        rental.updated_at = now_millis();
        self.repo.update_rental(rental.clone()).await?;
        tracing::info!(rental_id = %rental.id, "Payment failed for rental, unit released");
        Ok(rental)
    }

    /// Payment succeeded: move the order to Paid and commit its units
    ///
    /// Repeated delivery (webhook retry, redirect refresh) is a no-op.
    pub async fn complete_payment_for_order(&self, order: &Order) -> AppResult<Order> {
        if order.status == OrderStatus::Paid {
            return Ok(order.clone());
        }
        let updated = self
            .repo
            .update_order_status(&order.id, OrderStatus::Paid)
            .await?;
        self.allocator.confirm_for_reservation(&order.id);
        tracing::info!(order_id = %order.id, "Payment completed for order");
        Ok(updated)
    }

    /// Session expired or payment failed: release units, cancel the order
    ///
    /// Repeated delivery is a no-op.
    pub async fn fail_payment_for_order(&self, order: &Order) -> AppResult<Order> {
        if order.status == OrderStatus::Cancelled {
            return Ok(order.clone());
        }
        for item in &order.items {
            if let Err(e) = self.allocator.release_unit(
                &item.collectible_id,
                &item.warehouse_id,
                Some(&order.id),
            ) {
                tracing::warn!(
                    order_id = %order.id,
                    unit_id = %item.unit_id,
                    error = %e,
                    "Unit release on expired session"
                );
            }
        }
        let updated = self
            .repo
            .update_order_status(&order.id, OrderStatus::Cancelled)
            .await?;
        tracing::info!(order_id = %order.id, "Order cancelled after expired session");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_table() {
        let pending = check_cancellation_eligibility(OrderStatus::PendingPayment);
        assert!(pending.can_cancel);
        assert_eq!(pending.refund_fraction, 0.0);
        assert!(!pending.release_units);

        for status in [OrderStatus::Paid, OrderStatus::Allocated] {
            let e = check_cancellation_eligibility(status);
            assert!(e.can_cancel);
            assert_eq!(e.refund_fraction, 1.0);
            assert!(e.release_units);
        }

        let in_transit = check_cancellation_eligibility(OrderStatus::InTransit);
        assert!(in_transit.can_cancel);
        assert_eq!(in_transit.refund_fraction, 0.5);
        assert!(!in_transit.release_units);

        for status in [
            OrderStatus::ReadyForPickup,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            assert!(!check_cancellation_eligibility(status).can_cancel);
        }
    }
}
