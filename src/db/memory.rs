//! In-memory repository backend
//!
//! Process-local maps behind a reader/writer lock. All state is lost on
//! restart; the persistent backend is [`super::SurrealRepository`].

use super::{RepoError, RepoResult, Repository};
use crate::models::{
    Cart, CartItem, CartStatus, Collectible, Order, OrderStatus, PaymentStatus, Refund, Rental,
    User, Warehouse,
};
use crate::util::now_millis;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct Store {
    collectibles: HashMap<String, Collectible>,
    /// collectible id -> warehouses
    warehouses: HashMap<String, Vec<Warehouse>>,
    rentals: HashMap<String, Rental>,
    users: HashMap<String, User>,
    /// email -> user id (login lookup)
    users_by_email: HashMap<String, String>,
    /// token -> user id
    sessions: HashMap<String, String>,
    carts: HashMap<String, Cart>,
    /// user id -> active cart id
    active_cart_by_user: HashMap<String, String>,
    orders: HashMap<String, Order>,
    /// user id -> order ids (insertion order)
    orders_by_user: HashMap<String, Vec<String>>,
    /// order id -> refund
    refunds_by_order: HashMap<String, Refund>,
}

/// In-memory repository
#[derive(Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    // ==================== Collectibles ====================

    async fn get_all_collectibles(&self) -> RepoResult<Vec<Collectible>> {
        Ok(self.store.read().collectibles.values().cloned().collect())
    }

    async fn get_collectible(&self, id: &str) -> RepoResult<Option<Collectible>> {
        Ok(self.store.read().collectibles.get(id).cloned())
    }

    async fn add_collectible(&self, collectible: Collectible) -> RepoResult<()> {
        self.store
            .write()
            .collectibles
            .insert(collectible.id.clone(), collectible);
        Ok(())
    }

    // ==================== Warehouses ====================

    async fn get_warehouses_by_collectible(
        &self,
        collectible_id: &str,
    ) -> RepoResult<Vec<Warehouse>> {
        Ok(self
            .store
            .read()
            .warehouses
            .get(collectible_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_warehouse(&self, warehouse: Warehouse) -> RepoResult<()> {
        self.store
            .write()
            .warehouses
            .entry(warehouse.collectible_id.clone())
            .or_default()
            .push(warehouse);
        Ok(())
    }

    async fn get_all_warehouses(&self) -> RepoResult<HashMap<String, Vec<Warehouse>>> {
        Ok(self.store.read().warehouses.clone())
    }

    // ==================== Rentals ====================

    async fn create_rental(&self, rental: Rental) -> RepoResult<()> {
        let mut store = self.store.write();
        if store.rentals.contains_key(&rental.id) {
            return Err(RepoError::Duplicate(format!("rental {}", rental.id)));
        }
        store.rentals.insert(rental.id.clone(), rental);
        Ok(())
    }

    async fn get_rental(&self, id: &str) -> RepoResult<Option<Rental>> {
        Ok(self.store.read().rentals.get(id).cloned())
    }

    async fn update_rental(&self, rental: Rental) -> RepoResult<()> {
        let mut store = self.store.write();
        if !store.rentals.contains_key(&rental.id) {
            return Err(RepoError::NotFound(format!("rental {}", rental.id)));
        }
        store.rentals.insert(rental.id.clone(), rental);
        Ok(())
    }

    async fn get_all_rentals(&self) -> RepoResult<Vec<Rental>> {
        Ok(self.store.read().rentals.values().cloned().collect())
    }

    async fn find_pending_rental(
        &self,
        customer_email: &str,
        collectible_id: &str,
    ) -> RepoResult<Option<Rental>> {
        Ok(self
            .store
            .read()
            .rentals
            .values()
            .find(|r| {
                r.customer.email == customer_email
                    && r.collectible_id == collectible_id
                    && r.payment_status == PaymentStatus::Pending
            })
            .cloned())
    }

    async fn find_rental_by_payment(&self, payment_id: &str) -> RepoResult<Option<Rental>> {
        Ok(self
            .store
            .read()
            .rentals
            .values()
            .find(|r| r.payment_id == payment_id)
            .cloned())
    }

    async fn delete_all_rentals(&self) -> RepoResult<()> {
        self.store.write().rentals.clear();
        Ok(())
    }

    // ==================== Users ====================

    async fn create_user(&self, user: User) -> RepoResult<()> {
        let mut store = self.store.write();
        if store.users_by_email.contains_key(&user.email) {
            return Err(RepoError::Duplicate(format!("email {}", user.email)));
        }
        store
            .users_by_email
            .insert(user.email.clone(), user.id.clone());
        store.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_user(&self, id: &str) -> RepoResult<Option<User>> {
        Ok(self.store.read().users.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let store = self.store.read();
        Ok(store
            .users_by_email
            .get(email)
            .and_then(|id| store.users.get(id))
            .cloned())
    }

    // ==================== Sessions ====================

    async fn create_session(&self, user_id: &str, token: &str) -> RepoResult<()> {
        self.store
            .write()
            .sessions
            .insert(token.to_string(), user_id.to_string());
        Ok(())
    }

    async fn resolve_session(&self, token: &str) -> RepoResult<Option<String>> {
        Ok(self.store.read().sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> RepoResult<()> {
        self.store.write().sessions.remove(token);
        Ok(())
    }

    // ==================== Carts ====================

    async fn get_active_cart(&self, user_id: &str) -> RepoResult<Option<Cart>> {
        let store = self.store.read();
        Ok(store
            .active_cart_by_user
            .get(user_id)
            .and_then(|cart_id| store.carts.get(cart_id))
            .filter(|cart| cart.status == CartStatus::Active)
            .cloned())
    }

    async fn create_cart(&self, cart: Cart) -> RepoResult<()> {
        let mut store = self.store.write();
        if cart.status == CartStatus::Active {
            store
                .active_cart_by_user
                .insert(cart.user_id.clone(), cart.id.clone());
        }
        store.carts.insert(cart.id.clone(), cart);
        Ok(())
    }

    async fn update_cart(&self, cart: Cart) -> RepoResult<()> {
        let mut store = self.store.write();
        // Two racing checkouts: only the first transition out of Active wins
        if cart.status == CartStatus::CheckedOut
            && store
                .carts
                .get(&cart.id)
                .is_some_and(|stored| stored.status != CartStatus::Active)
        {
            return Err(RepoError::Conflict(format!(
                "cart {} already checked out",
                cart.id
            )));
        }
        if cart.status == CartStatus::Active {
            store
                .active_cart_by_user
                .insert(cart.user_id.clone(), cart.id.clone());
        } else {
            // Leaving Active clears the user's active-cart pointer in the
            // same critical section
            store.active_cart_by_user.remove(&cart.user_id);
        }
        store.carts.insert(cart.id.clone(), cart);
        Ok(())
    }

    async fn add_cart_item(&self, cart_id: &str, item: CartItem) -> RepoResult<Cart> {
        let mut store = self.store.write();
        let cart = store
            .carts
            .get_mut(cart_id)
            .ok_or_else(|| RepoError::NotFound(format!("cart {}", cart_id)))?;

        match cart.items.iter_mut().find(|existing| {
            existing.collectible_id == item.collectible_id && existing.store_id == item.store_id
        }) {
            Some(existing) => {
                existing.quantity += item.quantity;
                existing.rental_days = item.rental_days;
            }
            None => cart.items.push(item),
        }
        cart.updated_at = now_millis();
        Ok(cart.clone())
    }

    async fn update_cart_item(
        &self,
        cart_id: &str,
        collectible_id: &str,
        item: CartItem,
    ) -> RepoResult<Cart> {
        let mut store = self.store.write();
        let cart = store
            .carts
            .get_mut(cart_id)
            .ok_or_else(|| RepoError::NotFound(format!("cart {}", cart_id)))?;

        let existing = cart
            .items
            .iter_mut()
            .find(|i| i.collectible_id == collectible_id)
            .ok_or_else(|| RepoError::NotFound(format!("cart item {}", collectible_id)))?;
        *existing = item;
        cart.updated_at = now_millis();
        Ok(cart.clone())
    }

    async fn remove_cart_item(&self, cart_id: &str, collectible_id: &str) -> RepoResult<Cart> {
        let mut store = self.store.write();
        let cart = store
            .carts
            .get_mut(cart_id)
            .ok_or_else(|| RepoError::NotFound(format!("cart {}", cart_id)))?;

        let before = cart.items.len();
        cart.items.retain(|i| i.collectible_id != collectible_id);
        if cart.items.len() == before {
            return Err(RepoError::NotFound(format!("cart item {}", collectible_id)));
        }
        cart.updated_at = now_millis();
        Ok(cart.clone())
    }

    // ==================== Orders ====================

    async fn create_order(&self, order: Order) -> RepoResult<()> {
        let mut store = self.store.write();
        store
            .orders_by_user
            .entry(order.user_id.clone())
            .or_default()
            .push(order.id.clone());
        store.orders.insert(order.id.clone(), order);
        Ok(())
    }

    async fn get_order(&self, id: &str) -> RepoResult<Option<Order>> {
        Ok(self.store.read().orders.get(id).cloned())
    }

    async fn get_orders_by_user(&self, user_id: &str) -> RepoResult<Vec<Order>> {
        let store = self.store.read();
        Ok(store
            .orders_by_user
            .get(user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| store.orders.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_all_orders(&self) -> RepoResult<Vec<Order>> {
        Ok(self.store.read().orders.values().cloned().collect())
    }

    async fn update_order_status(&self, id: &str, status: OrderStatus) -> RepoResult<Order> {
        let mut store = self.store.write();
        let order = store
            .orders
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(format!("order {}", id)))?;

        if !order.status.can_transition_to(status) {
            return Err(RepoError::InvalidTransition(format!(
                "order {} cannot move {:?} -> {:?}",
                id, order.status, status
            )));
        }
        order.status = status;
        order.updated_at = now_millis();
        Ok(order.clone())
    }

    async fn update_order(&self, order: Order) -> RepoResult<()> {
        let mut store = self.store.write();
        if !store.orders.contains_key(&order.id) {
            return Err(RepoError::NotFound(format!("order {}", order.id)));
        }
        store.orders.insert(order.id.clone(), order);
        Ok(())
    }

    async fn find_order_by_payment(&self, payment_id: &str) -> RepoResult<Option<Order>> {
        Ok(self
            .store
            .read()
            .orders
            .values()
            .find(|o| o.payment_id == payment_id)
            .cloned())
    }

    // ==================== Refunds ====================

    async fn create_refund(&self, refund: Refund) -> RepoResult<()> {
        let mut store = self.store.write();
        if store.refunds_by_order.contains_key(&refund.order_id) {
            return Err(RepoError::Duplicate(format!(
                "refund for order {}",
                refund.order_id
            )));
        }
        store
            .refunds_by_order
            .insert(refund.order_id.clone(), refund);
        Ok(())
    }

    async fn get_refund_by_order(&self, order_id: &str) -> RepoResult<Option<Refund>> {
        Ok(self.store.read().refunds_by_order.get(order_id).cloned())
    }

    async fn update_refund(&self, refund: Refund) -> RepoResult<()> {
        self.store
            .write()
            .refunds_by_order
            .insert(refund.order_id.clone(), refund);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Size;

    fn collectible(id: &str) -> Collectible {
        Collectible {
            id: id.to_string(),
            name: format!("Collectible {}", id),
            description: String::new(),
            size: Size::S,
            image_url: String::new(),
            available: true,
        }
    }

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn test_collectible_round_trip() {
        let repo = MemoryRepository::new();
        repo.add_collectible(collectible("col-001")).await.unwrap();

        let found = repo.get_collectible("col-001").await.unwrap().unwrap();
        assert_eq!(found.id, "col-001");
        assert!(repo.get_collectible("missing").await.unwrap().is_none());
        assert_eq!(repo.get_all_collectibles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = MemoryRepository::new();
        repo.create_user(user("u1", "a@example.com")).await.unwrap();

        let err = repo
            .create_user(user("u2", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let repo = MemoryRepository::new();
        repo.create_session("u1", "token-1").await.unwrap();
        assert_eq!(
            repo.resolve_session("token-1").await.unwrap().as_deref(),
            Some("u1")
        );

        repo.delete_session("token-1").await.unwrap();
        assert!(repo.resolve_session("token-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cart_checkout_clears_active_pointer() {
        let repo = MemoryRepository::new();
        let mut cart = Cart::new_active("u1");
        let cart_id = cart.id.clone();
        repo.create_cart(cart.clone()).await.unwrap();
        assert!(repo.get_active_cart("u1").await.unwrap().is_some());

        cart.status = CartStatus::CheckedOut;
        repo.update_cart(cart).await.unwrap();

        assert!(repo.get_active_cart("u1").await.unwrap().is_none());
        // Cart record itself survives
        assert!(repo.store.read().carts.contains_key(&cart_id));
    }

    #[tokio::test]
    async fn test_cart_checkout_race_single_winner() {
        let repo = MemoryRepository::new();
        let mut cart = Cart::new_active("u1");
        repo.create_cart(cart.clone()).await.unwrap();

        cart.status = CartStatus::CheckedOut;
        repo.update_cart(cart.clone()).await.unwrap();

        // The second transition to CheckedOut loses
        let err = repo.update_cart(cart).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_cart_item_merges_on_collectible_and_store() {
        let repo = MemoryRepository::new();
        let cart = Cart::new_active("u1");
        let cart_id = cart.id.clone();
        repo.create_cart(cart).await.unwrap();

        let item = CartItem {
            collectible_id: "col-001".into(),
            store_id: "store-a".into(),
            rental_days: 7,
            quantity: 1,
        };
        repo.add_cart_item(&cart_id, item.clone()).await.unwrap();
        let merged = repo
            .add_cart_item(
                &cart_id,
                CartItem {
                    rental_days: 10,
                    quantity: 2,
                    ..item.clone()
                },
            )
            .await
            .unwrap();

        assert_eq!(merged.items.len(), 1);
        assert_eq!(merged.items[0].quantity, 3);
        assert_eq!(merged.items[0].rental_days, 10);

        // Same collectible at a different store stays separate
        let split = repo
            .add_cart_item(
                &cart_id,
                CartItem {
                    store_id: "store-b".into(),
                    ..item
                },
            )
            .await
            .unwrap();
        assert_eq!(split.items.len(), 2);
    }

    #[tokio::test]
    async fn test_order_status_cas_rejects_illegal_transition() {
        let repo = MemoryRepository::new();
        let order = Order {
            id: "order-1".into(),
            user_id: "u1".into(),
            store_id: "store-a".into(),
            status: OrderStatus::PendingPayment,
            total_amount: 1000.0,
            items: vec![],
            payment_id: "pay-1".into(),
            created_at: 0,
            updated_at: 0,
        };
        repo.create_order(order).await.unwrap();

        repo.update_order_status("order-1", OrderStatus::Paid)
            .await
            .unwrap();

        // A racing writer trying to re-cancel the pending payment loses
        let err = repo
            .update_order_status("order-1", OrderStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_refund_idempotency_key() {
        let repo = MemoryRepository::new();
        let refund = Refund {
            id: "ref-1".into(),
            order_id: "order-1".into(),
            user_id: "u1".into(),
            amount: 500.0,
            reason: "test".into(),
            status: crate::models::RefundStatus::Pending,
            created_at: 0,
            updated_at: 0,
        };
        repo.create_refund(refund.clone()).await.unwrap();

        let err = repo
            .create_refund(Refund {
                id: "ref-2".into(),
                ..refund
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }
}
