//! Business services
//!
//! - [`CheckoutService`]: cart-to-order saga with compensation
//! - [`OrderService`]: status lifecycle, cancellation, payment reconciliation
//! - [`RefundService`]: idempotent refund creation and processing

mod checkout;
mod order_service;
mod refund_service;

pub use checkout::{
    CheckoutService, CheckoutSummary, SingleCheckoutRequest, SingleCheckoutResponse,
};
pub use order_service::{
    CancellationEligibility, CancellationOutcome, OrderService, check_cancellation_eligibility,
};
pub use refund_service::RefundService;
