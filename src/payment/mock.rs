//! In-process payment gateway for tests and local development
//!
//! Sessions are recorded in memory; `fail_next_session` forces the next
//! `create_session` to error so saga compensation paths can be exercised.

use super::{CheckoutSession, GatewayError, PaymentGateway};
use crate::models::PaymentStatus;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone)]
pub struct RecordedRefund {
    pub order_id: String,
    pub amount: f64,
}

#[derive(Default)]
struct MockState {
    /// session id -> status
    sessions: HashMap<String, PaymentStatus>,
    refunds: Vec<RecordedRefund>,
}

/// Deterministic gateway double
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
    counter: AtomicU64,
    fail_next_session: AtomicBool,
    fail_refunds: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create_session` call fail
    pub fn fail_next_session(&self) {
        self.fail_next_session.store(true, Ordering::SeqCst);
    }

    /// Make all `refund` calls fail
    pub fn fail_refunds(&self, fail: bool) {
        self.fail_refunds.store(fail, Ordering::SeqCst);
    }

    /// Mark a session as paid (simulates the customer completing payment)
    pub fn mark_paid(&self, session_id: &str) {
        self.state
            .lock()
            .sessions
            .insert(session_id.to_string(), PaymentStatus::Completed);
    }

    /// Refunds issued so far
    pub fn refunds(&self) -> Vec<RecordedRefund> {
        self.state.lock().refunds.clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_session(
        &self,
        _amount: f64,
        reference_id: &str,
        _description: &str,
        _success_url: &str,
        _cancel_url: &str,
    ) -> Result<CheckoutSession, GatewayError> {
        if self.fail_next_session.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Api {
                status: 503,
                body: "mock gateway unavailable".into(),
            });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let payment_id = format!("mock-session-{n}");
        self.state
            .lock()
            .sessions
            .insert(payment_id.clone(), PaymentStatus::Pending);

        Ok(CheckoutSession {
            checkout_url: format!("https://mock.checkout/{payment_id}?ref={reference_id}"),
            payment_id,
        })
    }

    async fn verify(&self, session_id: &str) -> Result<PaymentStatus, GatewayError> {
        self.state
            .lock()
            .sessions
            .get(session_id)
            .copied()
            .ok_or_else(|| GatewayError::Malformed(format!("unknown session {session_id}")))
    }

    async fn refund(&self, order_id: &str, amount: f64) -> Result<(), GatewayError> {
        if self.fail_refunds.load(Ordering::SeqCst) {
            return Err(GatewayError::Api {
                status: 400,
                body: "mock refund rejected".into(),
            });
        }
        self.state.lock().refunds.push(RecordedRefund {
            order_id: order_id.to_string(),
            amount,
        });
        Ok(())
    }
}
