//! Checkout coordination
//!
//! Orchestrates the cart-to-payment saga. Allocation happens here, never in
//! the cart: units are reserved item by item, and any failure after a
//! successful allocation releases every reserved unit before the error is
//! surfaced. No partial orders are ever written.
//!
//! The allocation manager lock is not held across the gateway call; the
//! reservation timeout covers the gateway round trip.

use crate::allocation::AllocationManager;
use crate::db::Repository;
use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{
    Customer, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, Rental,
};
use crate::payment::PaymentGateway;
use crate::pricing;
use crate::util::{new_id, now_millis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of a successful cart checkout
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSummary {
    pub order_id: String,
    pub total: f64,
    pub payment_url: String,
    pub status: OrderStatus,
}

/// Legacy single-item checkout request
#[derive(Debug, Clone, Deserialize)]
pub struct SingleCheckoutRequest {
    pub collectible_id: String,
    pub store_id: String,
    pub duration: u32,
    pub payment_method: PaymentMethod,
    pub customer: Customer,
}

/// Legacy single-item checkout response
#[derive(Debug, Clone, Serialize)]
pub struct SingleCheckoutResponse {
    pub rental_id: String,
    pub total_fee: f64,
    pub eta: u32,
    pub payment_url: String,
    pub message: String,
}

/// Cart-to-order saga coordinator
pub struct CheckoutService {
    repo: Arc<dyn Repository>,
    allocator: Arc<AllocationManager>,
    gateway: Arc<dyn PaymentGateway>,
    public_base_url: String,
}

impl CheckoutService {
    pub fn new(
        repo: Arc<dyn Repository>,
        allocator: Arc<AllocationManager>,
        gateway: Arc<dyn PaymentGateway>,
        public_base_url: String,
    ) -> Self {
        Self {
            repo,
            allocator,
            gateway,
            public_base_url,
        }
    }

    fn redirect_urls(&self, key: &str, id: &str) -> (String, String) {
        (
            format!("{}/payment/success?{key}={id}", self.public_base_url),
            format!("{}/payment/failed?{key}={id}", self.public_base_url),
        )
    }

    /// Release every unit allocated so far (saga compensation)
    fn release_allocated(&self, reservation_id: &str, items: &[OrderItem]) {
        for item in items {
            if let Err(e) = self.allocator.release_unit(
                &item.collectible_id,
                &item.warehouse_id,
                Some(reservation_id),
            ) {
                tracing::error!(
                    unit_id = %item.unit_id,
                    error = %e,
                    "Compensation failed to release unit"
                );
            }
        }
    }

    /// Multi-item checkout from the user's active cart
    ///
    /// Walks the cart in declared order collecting every allocation failure
    /// instead of short-circuiting, so the caller learns the full failed
    /// set. Any failure releases all successfully reserved units.
    pub async fn checkout_from_cart(&self, user_id: &str) -> AppResult<CheckoutSummary> {
        let mut cart = self
            .repo
            .get_active_cart(user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::CartNotFound))?;

        if cart.items.is_empty() {
            return Err(AppError::new(ErrorCode::CartEmpty));
        }

        // Order id is pre-generated: it tags every reservation made below
        let order_id = new_id();
        let mut order_items: Vec<OrderItem> = Vec::new();
        let mut total_amount = 0.0;
        let mut failed: Vec<String> = Vec::new();

        for cart_item in &cart.items {
            let Some(collectible) = self.repo.get_collectible(&cart_item.collectible_id).await?
            else {
                failed.push(cart_item.collectible_id.clone());
                continue;
            };

            let allocated = match self.allocator.allocate(
                &cart_item.collectible_id,
                &cart_item.store_id,
                &order_id,
            ) {
                Ok(a) => a,
                Err(e) => {
                    tracing::info!(
                        collectible_id = %cart_item.collectible_id,
                        error = %e,
                        "Allocation failed during checkout"
                    );
                    failed.push(cart_item.collectible_id.clone());
                    continue;
                }
            };

            let fee = pricing::calculate_rental_fee(collectible.size, cart_item.rental_days);
            order_items.push(OrderItem {
                collectible_id: cart_item.collectible_id.clone(),
                collectible_name: collectible.name,
                unit_id: allocated.unit.id,
                warehouse_id: allocated.unit.warehouse_id,
                rental_days: cart_item.rental_days,
                eta_days: allocated.distance,
                price: fee.total_fee,
            });
            total_amount += fee.total_fee;
        }

        if !failed.is_empty() {
            self.release_allocated(&order_id, &order_items);
            return Err(AppError::partial_allocation(failed));
        }

        let (success_url, cancel_url) = self.redirect_urls("order_id", &order_id);
        let session = match self
            .gateway
            .create_session(
                total_amount,
                &order_id,
                "Rental Order",
                &success_url,
                &cancel_url,
            )
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "Payment session creation failed");
                self.release_allocated(&order_id, &order_items);
                return Err(AppError::new(ErrorCode::PaymentSessionFailed));
            }
        };

        let now = now_millis();
        let order = Order {
            id: order_id.clone(),
            user_id: user_id.to_string(),
            store_id: cart.items[0].store_id.clone(),
            status: OrderStatus::PendingPayment,
            total_amount,
            items: order_items,
            payment_id: session.payment_id,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.repo.create_order(order.clone()).await {
            tracing::error!(error = %e, order_id = %order.id, "Failed to persist order");
            self.release_allocated(&order_id, &order.items);
            return Err(e.into());
        }

        cart.status = crate::models::CartStatus::CheckedOut;
        cart.updated_at = now;
        // The order is durably persisted at this point. Losing the
        // cart-transition race to a concurrent checkout does not undo it.
        if let Err(e) = self.repo.update_cart(cart).await {
            tracing::warn!(order_id = %order.id, error = %e, "Cart checkout transition lost");
        }

        tracing::info!(
            order_id = %order.id,
            user_id,
            total_amount,
            "Order created from cart"
        );

        Ok(CheckoutSummary {
            order_id,
            total: total_amount,
            payment_url: session.checkout_url,
            status: OrderStatus::PendingPayment,
        })
    }

    /// Legacy single-item checkout, idempotent on (customer email, collectible)
    pub async fn checkout_single(
        &self,
        req: SingleCheckoutRequest,
    ) -> AppResult<SingleCheckoutResponse> {
        // A pending rental for the same customer and collectible is returned
        // unchanged instead of reserving a second unit
        if let Some(existing) = self
            .repo
            .find_pending_rental(&req.customer.email, &req.collectible_id)
            .await?
        {
            tracing::info!(
                rental_id = %existing.id,
                email = %req.customer.email,
                "Reusing existing pending rental"
            );
            return Ok(SingleCheckoutResponse {
                rental_id: existing.id,
                total_fee: existing.total_fee,
                eta: existing.eta,
                payment_url: existing.payment_url,
                message: "Existing rental found. Please complete payment.".to_string(),
            });
        }

        let collectible = self
            .repo
            .get_collectible(&req.collectible_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::CollectibleNotFound))?;

        let rental_id = new_id();
        let allocated = self
            .allocator
            .allocate(&req.collectible_id, &req.store_id, &rental_id)
            .map_err(AppError::from)?;

        let fee = pricing::calculate_rental_fee(collectible.size, req.duration);

        let (success_url, cancel_url) = self.redirect_urls("rental_id", &rental_id);
        let description = format!("Rental for {} ({} days)", collectible.name, req.duration);
        let session = match self
            .gateway
            .create_session(
                fee.total_fee,
                &rental_id,
                &description,
                &success_url,
                &cancel_url,
            )
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "Payment session creation failed");
                if let Err(release_err) = self.allocator.release_unit(
                    &req.collectible_id,
                    &allocated.unit.warehouse_id,
                    Some(&rental_id),
                ) {
                    tracing::error!(error = %release_err, "Compensation failed to release unit");
                }
                return Err(AppError::new(ErrorCode::PaymentSessionFailed));
            }
        };

        let now = now_millis();
        let rental = Rental {
            id: rental_id.clone(),
            collectible_id: req.collectible_id.clone(),
            collectible_name: collectible.name,
            store_id: req.store_id,
            warehouse_id: allocated.unit.warehouse_id.clone(),
            customer: req.customer,
            duration: req.duration,
            daily_rate: fee.daily_rate,
            total_fee: fee.total_fee,
            payment_method: req.payment_method,
            payment_status: PaymentStatus::Pending,
            payment_id: session.payment_id,
            payment_url: session.checkout_url.clone(),
            eta: allocated.distance,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.repo.create_rental(rental).await {
            tracing::error!(error = %e, rental_id = %rental_id, "Failed to persist rental");
            if let Err(release_err) = self.allocator.release_unit(
                &req.collectible_id,
                &allocated.unit.warehouse_id,
                Some(&rental_id),
            ) {
                tracing::error!(error = %release_err, "Compensation failed to release unit");
            }
            return Err(e.into());
        }

        tracing::info!(rental_id = %rental_id, total_fee = fee.total_fee, "Rental created");

        Ok(SingleCheckoutResponse {
            rental_id,
            total_fee: fee.total_fee,
            eta: allocated.distance,
            payment_url: session.checkout_url,
            message: "Rental created successfully. Please complete payment.".to_string(),
        })
    }
}
