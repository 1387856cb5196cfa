//! Refund engine
//!
//! Refund creation is idempotent on the order id: repeated calls return the
//! stored refund with the same id and amount. A refund starts `Pending`,
//! moves to `Processed` when the gateway accepts it, and to `Failed`
//! otherwise.

use crate::db::{RepoError, Repository};
use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{Refund, RefundStatus};
use crate::payment::PaymentGateway;
use crate::util::{new_id, now_millis};
use std::sync::Arc;

pub struct RefundService {
    repo: Arc<dyn Repository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl RefundService {
    pub fn new(repo: Arc<dyn Repository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { repo, gateway }
    }

    /// Create and process a refund for an order (idempotent)
    ///
    /// Returns the existing refund unchanged when one already exists. On
    /// gateway failure the refund is persisted as `Failed` and the error is
    /// surfaced to the caller.
    pub async fn create_refund(
        &self,
        order_id: &str,
        amount: f64,
        reason: &str,
    ) -> AppResult<Refund> {
        if let Some(existing) = self.repo.get_refund_by_order(order_id).await? {
            tracing::info!(
                refund_id = %existing.id,
                order_id,
                "Refund already exists for order"
            );
            return Ok(existing);
        }

        let order = self
            .repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

        let now = now_millis();
        let mut refund = Refund {
            id: new_id(),
            order_id: order_id.to_string(),
            user_id: order.user_id,
            amount,
            reason: reason.to_string(),
            status: RefundStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        match self.repo.create_refund(refund.clone()).await {
            Ok(()) => {}
            // A concurrent caller won the insert; return its refund
            Err(RepoError::Duplicate(_)) => {
                if let Some(existing) = self.repo.get_refund_by_order(order_id).await? {
                    return Ok(existing);
                }
                return Err(AppError::internal("refund vanished after duplicate insert"));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(refund_id = %refund.id, order_id, amount, "Refund created");

        match self.gateway.refund(order_id, amount).await {
            Ok(()) => {
                refund.status = RefundStatus::Processed;
                refund.updated_at = now_millis();
                self.repo.update_refund(refund.clone()).await?;
                tracing::info!(refund_id = %refund.id, "Refund processed");
                Ok(refund)
            }
            Err(e) => {
                tracing::error!(refund_id = %refund.id, error = %e, "Refund processing failed");
                refund.status = RefundStatus::Failed;
                refund.updated_at = now_millis();
                self.repo.update_refund(refund).await?;
                Err(AppError::new(ErrorCode::RefundFailed))
            }
        }
    }

    /// Refund for an order, if any
    pub async fn get_refund_by_order(&self, order_id: &str) -> AppResult<Option<Refund>> {
        Ok(self.repo.get_refund_by_order(order_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;
    use crate::models::{Order, OrderStatus};
    use crate::payment::mock::MockGateway;

    async fn setup(total: f64) -> (RefundService, Arc<MockGateway>, String) {
        let repo: Arc<dyn Repository> = Arc::new(MemoryRepository::new());
        let gateway = Arc::new(MockGateway::new());

        let order = Order {
            id: "order-1".into(),
            user_id: "u1".into(),
            store_id: "store-a".into(),
            status: OrderStatus::Paid,
            total_amount: total,
            items: vec![],
            payment_id: "pay-1".into(),
            created_at: 0,
            updated_at: 0,
        };
        repo.create_order(order).await.unwrap();

        (
            RefundService::new(repo, gateway.clone()),
            gateway,
            "order-1".into(),
        )
    }

    #[tokio::test]
    async fn test_refund_is_idempotent() {
        let (service, gateway, order_id) = setup(1000.0).await;

        let first = service
            .create_refund(&order_id, 1000.0, "cancelled")
            .await
            .unwrap();
        let second = service
            .create_refund(&order_id, 1000.0, "cancelled")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.amount, second.amount);
        assert_eq!(first.status, RefundStatus::Processed);
        // The gateway saw exactly one refund call
        assert_eq!(gateway.refunds().len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_marks_refund_failed() {
        let (service, gateway, order_id) = setup(1000.0).await;
        gateway.fail_refunds(true);

        let err = service
            .create_refund(&order_id, 1000.0, "cancelled")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RefundFailed);

        let stored = service.get_refund_by_order(&order_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RefundStatus::Failed);
    }

    #[tokio::test]
    async fn test_refund_unknown_order() {
        let (service, _gateway, _) = setup(1000.0).await;
        let err = service
            .create_refund("missing", 10.0, "x")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }
}
