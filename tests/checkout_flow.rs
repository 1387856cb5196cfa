//! 结算全流程测试
//!
//! 用内存仓储 + mock 网关走通 完整 saga：分配 → 支付会话 → 订单 →
//! webhook 对账 → 取消与退款。覆盖补偿路径：部分分配失败、网关失败、
//! 会话过期。

use rental_server::core::{Config, ServerState};
use rental_server::db::{MemoryRepository, Repository};
use rental_server::error::ErrorCode;
use rental_server::models::{Cart, CartItem, OrderStatus, RefundStatus, UnitState};
use rental_server::payment::mock::MockGateway;
use rental_server::payment::{PaymentGateway, WebhookEvent};
use std::sync::Arc;

async fn setup() -> (ServerState, Arc<MockGateway>) {
    let repo: Arc<dyn Repository> = Arc::new(MemoryRepository::new());
    let mock = Arc::new(MockGateway::new());
    let gateway: Arc<dyn PaymentGateway> = mock.clone();

    let state = ServerState::with_components(Config::from_env(), repo, gateway)
        .await
        .expect("state initialization failed");
    (state, mock)
}

/// 建一个带指定条目的活跃购物车
async fn cart_with_items(state: &ServerState, user_id: &str, items: &[(&str, &str, u32)]) {
    let cart = Cart::new_active(user_id);
    let cart_id = cart.id.clone();
    state.repo.create_cart(cart).await.unwrap();
    for (collectible_id, store_id, rental_days) in items {
        state
            .repo
            .add_cart_item(
                &cart_id,
                CartItem {
                    collectible_id: collectible_id.to_string(),
                    store_id: store_id.to_string(),
                    rental_days: *rental_days,
                    quantity: 1,
                },
            )
            .await
            .unwrap();
    }
}

// ========================================================================
// Happy path: checkout -> paid webhook -> cancel -> refund
// ========================================================================

#[tokio::test]
async fn test_checkout_pays_and_cancels_with_full_refund() {
    let (state, mock) = setup().await;

    // col-001 (S, 7 days, 7000) + col-003 (L, 10 days, 100000)
    cart_with_items(
        &state,
        "user-1",
        &[("col-001", "store-a", 7), ("col-003", "store-c", 10)],
    )
    .await;

    let summary = state.checkout.checkout_from_cart("user-1").await.unwrap();
    assert_eq!(summary.total, 107_000.0);
    assert_eq!(summary.status, OrderStatus::PendingPayment);
    assert!(summary.payment_url.starts_with("https://mock.checkout/"));

    // Inventory held, cart consumed
    assert_eq!(state.allocator.get_total_stock("col-001"), 1);
    assert_eq!(state.allocator.get_total_stock("col-003"), 1);
    assert!(
        state
            .repo
            .get_active_cart("user-1")
            .await
            .unwrap()
            .is_none()
    );

    let order = state
        .repo
        .get_order(&summary.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::PendingPayment);
    assert_eq!(order.items.len(), 2);
    // Nearest warehouse for col-001 at store-a is wh-001-1 (distance 1)
    assert_eq!(order.items[0].warehouse_id, "wh-001-1");
    assert_eq!(order.items[0].eta_days, 1);

    // Gateway confirms payment
    mock.mark_paid(&order.payment_id);
    state
        .orders
        .handle_webhook(WebhookEvent::PaymentPaid(order.payment_id.clone()))
        .await;

    let paid = state
        .repo
        .get_order(&summary.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);
    let committed = state
        .allocator
        .snapshot_inventory()
        .into_iter()
        .filter(|u| u.state == UnitState::Committed)
        .count();
    assert_eq!(committed, 2);

    // Cancel while Paid: full refund, units released
    let outcome = state.orders.cancel_order(paid).await.unwrap();
    assert_eq!(outcome.refund_amount, 107_000.0);
    assert_eq!(outcome.status, OrderStatus::Refunded);
    assert_eq!(outcome.refund_status, Some(RefundStatus::Processed));
    assert_eq!(state.allocator.get_total_stock("col-001"), 2);
    assert_eq!(state.allocator.get_total_stock("col-003"), 2);
    assert_eq!(mock.refunds().len(), 1);
    assert_eq!(mock.refunds()[0].amount, 107_000.0);
}

#[tokio::test]
async fn test_cancel_twice_returns_same_refund() {
    let (state, mock) = setup().await;
    cart_with_items(&state, "user-1", &[("col-001", "store-a", 7)]).await;

    let summary = state.checkout.checkout_from_cart("user-1").await.unwrap();
    let order = state
        .repo
        .get_order(&summary.order_id)
        .await
        .unwrap()
        .unwrap();
    mock.mark_paid(&order.payment_id);
    state
        .orders
        .handle_webhook(WebhookEvent::PaymentPaid(order.payment_id.clone()))
        .await;

    let paid = state
        .repo
        .get_order(&summary.order_id)
        .await
        .unwrap()
        .unwrap();
    let first = state.orders.cancel_order(paid).await.unwrap();

    let refunded = state
        .repo
        .get_order(&summary.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refunded.status, OrderStatus::Refunded);

    // Second cancel is a no-op returning the recorded refund
    let second = state.orders.cancel_order(refunded).await.unwrap();
    assert_eq!(first.refund_id, second.refund_id);
    assert_eq!(first.refund_amount, second.refund_amount);
    // The gateway was charged exactly once
    assert_eq!(mock.refunds().len(), 1);
}

// ========================================================================
// Compensation paths
// ========================================================================

#[tokio::test]
async fn test_partial_allocation_releases_everything() {
    let (state, _mock) = setup().await;

    // Drain col-003 so the second cart item cannot allocate
    state
        .allocator
        .allocate("col-003", "store-a", "hold-1")
        .unwrap();
    state
        .allocator
        .allocate("col-003", "store-a", "hold-2")
        .unwrap();

    cart_with_items(
        &state,
        "user-1",
        &[("col-001", "store-a", 7), ("col-003", "store-a", 7)],
    )
    .await;

    let stock_before = state.allocator.get_total_stock("col-001");
    let err = state
        .checkout
        .checkout_from_cart("user-1")
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::PartialAllocation);
    let failed = err.details.as_ref().unwrap().get("failed").unwrap();
    assert_eq!(failed, &serde_json::json!(["col-003"]));

    // The successfully reserved col-001 unit went back to the pool
    assert_eq!(state.allocator.get_total_stock("col-001"), stock_before);

    // Cart stays active: the user can fix it and retry
    assert!(
        state
            .repo
            .get_active_cart("user-1")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_gateway_failure_releases_units() {
    let (state, mock) = setup().await;
    cart_with_items(&state, "user-1", &[("col-001", "store-a", 7)]).await;

    mock.fail_next_session();
    let err = state
        .checkout
        .checkout_from_cart("user-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentSessionFailed);

    assert_eq!(state.allocator.get_total_stock("col-001"), 2);
    // No order was written
    assert!(state.repo.get_all_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_session_cancels_order_and_releases() {
    let (state, _mock) = setup().await;
    cart_with_items(&state, "user-1", &[("col-002", "store-b", 14)]).await;

    let summary = state.checkout.checkout_from_cart("user-1").await.unwrap();
    assert_eq!(state.allocator.get_total_stock("col-002"), 2);

    let order = state
        .repo
        .get_order(&summary.order_id)
        .await
        .unwrap()
        .unwrap();
    state
        .orders
        .handle_webhook(WebhookEvent::SessionExpired(order.payment_id.clone()))
        .await;

    let cancelled = state
        .repo
        .get_order(&summary.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(state.allocator.get_total_stock("col-002"), 3);
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let (state, _mock) = setup().await;
    cart_with_items(&state, "user-1", &[]).await;

    let err = state
        .checkout
        .checkout_from_cart("user-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CartEmpty);
}

#[tokio::test]
async fn test_checkout_without_cart_is_rejected() {
    let (state, _mock) = setup().await;
    let err = state
        .checkout
        .checkout_from_cart("user-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CartNotFound);
}

// ========================================================================
// Legacy single-item path
// ========================================================================

#[tokio::test]
async fn test_single_checkout_is_idempotent_per_customer() {
    use rental_server::models::{Customer, PaymentMethod};
    use rental_server::services::SingleCheckoutRequest;

    let (state, _mock) = setup().await;

    let request = SingleCheckoutRequest {
        collectible_id: "col-001".to_string(),
        store_id: "store-a".to_string(),
        duration: 7,
        payment_method: PaymentMethod::Gcash,
        customer: Customer {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
        },
    };

    let first = state.checkout.checkout_single(request.clone()).await.unwrap();
    assert_eq!(first.total_fee, 7000.0);
    assert_eq!(first.eta, 1);
    assert_eq!(state.allocator.get_total_stock("col-001"), 1);

    // Same customer, same collectible: the pending rental is reused and no
    // second unit is reserved
    let second = state.checkout.checkout_single(request).await.unwrap();
    assert_eq!(second.rental_id, first.rental_id);
    assert_eq!(second.total_fee, first.total_fee);
    assert_eq!(state.allocator.get_total_stock("col-001"), 1);
}

#[tokio::test]
async fn test_single_checkout_no_capacity_conflict() {
    use rental_server::models::{Customer, PaymentMethod};
    use rental_server::services::SingleCheckoutRequest;

    let (state, _mock) = setup().await;
    state
        .allocator
        .allocate("col-001", "store-a", "hold-1")
        .unwrap();
    state
        .allocator
        .allocate("col-001", "store-a", "hold-2")
        .unwrap();

    let request = SingleCheckoutRequest {
        collectible_id: "col-001".to_string(),
        store_id: "store-a".to_string(),
        duration: 7,
        payment_method: PaymentMethod::Card,
        customer: Customer {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            phone: String::new(),
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
        },
    };

    let err = state.checkout.checkout_single(request).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NoCapacity);
}
