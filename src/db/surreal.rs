//! SurrealDB repository backend
//!
//! Embedded key-value store, one table per entity keyed by the domain id
//! (refunds are keyed by order id, which makes the one-refund-per-order
//! rule a storage-level guarantee). Rows store the entity fields without
//! the id; reads project the record key back with `record::id(id)`.

use super::{RepoError, RepoResult, Repository};
use crate::models::{
    Cart, CartItem, CartStatus, Collectible, Order, OrderStatus, PaymentStatus, Refund,
    RefundStatus, Rental, User, Warehouse,
};
use crate::util::now_millis;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use surrealdb::engine::local::{Db, Mem, RocksDb};
use surrealdb::{RecordId, Surreal};

const COLLECTIBLE: &str = "collectible";
const WAREHOUSE: &str = "warehouse";
const RENTAL: &str = "rental";
const USER: &str = "user";
const SESSION: &str = "session";
const CART: &str = "cart";
const ORDER: &str = "order";
const REFUND: &str = "refund";

/// SurrealDB-backed repository
#[derive(Clone)]
pub struct SurrealRepository {
    db: Surreal<Db>,
}

/// Session row, keyed by token
#[derive(Debug, Serialize, Deserialize)]
struct SessionRow {
    user_id: String,
}

/// Refund row, keyed by order id; the refund's own id lives in `refund_id`
#[derive(Debug, Serialize, Deserialize)]
struct RefundRow {
    refund_id: String,
    user_id: String,
    amount: f64,
    reason: String,
    status: RefundStatus,
    created_at: i64,
    updated_at: i64,
}

impl RefundRow {
    fn from_refund(refund: &Refund) -> Self {
        Self {
            refund_id: refund.id.clone(),
            user_id: refund.user_id.clone(),
            amount: refund.amount,
            reason: refund.reason.clone(),
            status: refund.status,
            created_at: refund.created_at,
            updated_at: refund.updated_at,
        }
    }

    fn into_refund(self, order_id: &str) -> Refund {
        Refund {
            id: self.refund_id,
            order_id: order_id.to_string(),
            user_id: self.user_id,
            amount: self.amount,
            reason: self.reason,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Serialize an entity and strip its `id` field; the record key carries it
fn content_of<T: Serialize>(entity: &T) -> RepoResult<serde_json::Value> {
    let mut value =
        serde_json::to_value(entity).map_err(|e| RepoError::Database(e.to_string()))?;
    if let Some(map) = value.as_object_mut() {
        map.remove("id");
    }
    Ok(value)
}

impl SurrealRepository {
    /// Open the store at the given path (RocksDB engine)
    pub async fn open(path: &str) -> RepoResult<Self> {
        let db = Surreal::new::<RocksDb>(path).await?;
        db.use_ns("rental").use_db("rental").await?;
        tracing::info!(path, "SurrealDB repository opened");
        Ok(Self { db })
    }

    /// Open an in-memory store (tests)
    pub async fn open_in_memory() -> RepoResult<Self> {
        let db = Surreal::new::<Mem>(()).await?;
        db.use_ns("rental").use_db("rental").await?;
        Ok(Self { db })
    }

    async fn create_keyed<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        entity: &T,
    ) -> RepoResult<()> {
        let content = content_of(entity)?;
        let _: Option<serde_json::Value> = self
            .db
            .create(RecordId::from_table_key(table, id))
            .content(content)
            .await?;
        Ok(())
    }

    async fn upsert_keyed<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        entity: &T,
    ) -> RepoResult<()> {
        let content = content_of(entity)?;
        let _: Option<serde_json::Value> = self
            .db
            .upsert(RecordId::from_table_key(table, id))
            .content(content)
            .await?;
        Ok(())
    }

    /// Replace an existing record, failing with NotFound when absent
    async fn update_keyed<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        entity: &T,
    ) -> RepoResult<()> {
        if self.get_keyed::<serde_json::Value>(table, id).await?.is_none() {
            return Err(RepoError::NotFound(format!("{} {}", table, id)));
        }
        self.upsert_keyed(table, id, entity).await
    }

    async fn get_keyed<T: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
        id: &str,
    ) -> RepoResult<Option<T>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT *, record::id(id) AS id FROM {} WHERE id = $id",
                table
            ))
            .bind(("id", RecordId::from_table_key(table, id)))
            .await?;
        let rows: Vec<T> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn get_all<T: for<'de> Deserialize<'de>>(&self, table: &str) -> RepoResult<Vec<T>> {
        let mut result = self
            .db
            .query(format!("SELECT *, record::id(id) AS id FROM {}", table))
            .await?;
        Ok(result.take(0)?)
    }
}

#[async_trait]
impl Repository for SurrealRepository {
    // ==================== Collectibles ====================

    async fn get_all_collectibles(&self) -> RepoResult<Vec<Collectible>> {
        self.get_all(COLLECTIBLE).await
    }

    async fn get_collectible(&self, id: &str) -> RepoResult<Option<Collectible>> {
        self.get_keyed(COLLECTIBLE, id).await
    }

    async fn add_collectible(&self, collectible: Collectible) -> RepoResult<()> {
        self.upsert_keyed(COLLECTIBLE, &collectible.id, &collectible)
            .await
    }

    // ==================== Warehouses ====================

    async fn get_warehouses_by_collectible(
        &self,
        collectible_id: &str,
    ) -> RepoResult<Vec<Warehouse>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT *, record::id(id) AS id FROM {} WHERE collectible_id = $cid",
                WAREHOUSE
            ))
            .bind(("cid", collectible_id.to_string()))
            .await?;
        Ok(result.take(0)?)
    }

    async fn add_warehouse(&self, warehouse: Warehouse) -> RepoResult<()> {
        self.upsert_keyed(WAREHOUSE, &warehouse.id, &warehouse)
            .await
    }

    async fn get_all_warehouses(&self) -> RepoResult<HashMap<String, Vec<Warehouse>>> {
        let warehouses: Vec<Warehouse> = self.get_all(WAREHOUSE).await?;
        let mut grouped: HashMap<String, Vec<Warehouse>> = HashMap::new();
        for warehouse in warehouses {
            grouped
                .entry(warehouse.collectible_id.clone())
                .or_default()
                .push(warehouse);
        }
        Ok(grouped)
    }

    // ==================== Rentals ====================

    async fn create_rental(&self, rental: Rental) -> RepoResult<()> {
        if self
            .get_keyed::<serde_json::Value>(RENTAL, &rental.id)
            .await?
            .is_some()
        {
            return Err(RepoError::Duplicate(format!("rental {}", rental.id)));
        }
        self.create_keyed(RENTAL, &rental.id, &rental).await
    }

    async fn get_rental(&self, id: &str) -> RepoResult<Option<Rental>> {
        self.get_keyed(RENTAL, id).await
    }

    async fn update_rental(&self, rental: Rental) -> RepoResult<()> {
        self.update_keyed(RENTAL, &rental.id, &rental).await
    }

    async fn get_all_rentals(&self) -> RepoResult<Vec<Rental>> {
        self.get_all(RENTAL).await
    }

    async fn find_pending_rental(
        &self,
        customer_email: &str,
        collectible_id: &str,
    ) -> RepoResult<Option<Rental>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT *, record::id(id) AS id FROM {} \
                 WHERE customer.email = $email AND collectible_id = $cid \
                 AND payment_status = $pending LIMIT 1",
                RENTAL
            ))
            .bind(("email", customer_email.to_string()))
            .bind(("cid", collectible_id.to_string()))
            .bind(("pending", PaymentStatus::Pending))
            .await?;
        let rows: Vec<Rental> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn find_rental_by_payment(&self, payment_id: &str) -> RepoResult<Option<Rental>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT *, record::id(id) AS id FROM {} WHERE payment_id = $pid LIMIT 1",
                RENTAL
            ))
            .bind(("pid", payment_id.to_string()))
            .await?;
        let rows: Vec<Rental> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn delete_all_rentals(&self) -> RepoResult<()> {
        self.db.query(format!("DELETE {}", RENTAL)).await?;
        Ok(())
    }

    // ==================== Users ====================

    async fn create_user(&self, user: User) -> RepoResult<()> {
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(RepoError::Duplicate(format!("email {}", user.email)));
        }
        self.create_keyed(USER, &user.id, &user).await
    }

    async fn get_user(&self, id: &str) -> RepoResult<Option<User>> {
        self.get_keyed(USER, id).await
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT *, record::id(id) AS id FROM {} WHERE email = $email LIMIT 1",
                USER
            ))
            .bind(("email", email.to_string()))
            .await?;
        let rows: Vec<User> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    // ==================== Sessions ====================

    async fn create_session(&self, user_id: &str, token: &str) -> RepoResult<()> {
        let row = SessionRow {
            user_id: user_id.to_string(),
        };
        let _: Option<serde_json::Value> = self
            .db
            .upsert(RecordId::from_table_key(SESSION, token))
            .content(row)
            .await?;
        Ok(())
    }

    async fn resolve_session(&self, token: &str) -> RepoResult<Option<String>> {
        let row: Option<SessionRow> = self
            .db
            .select(RecordId::from_table_key(SESSION, token))
            .await?;
        Ok(row.map(|r| r.user_id))
    }

    async fn delete_session(&self, token: &str) -> RepoResult<()> {
        let _: Option<SessionRow> = self
            .db
            .delete(RecordId::from_table_key(SESSION, token))
            .await?;
        Ok(())
    }

    // ==================== Carts ====================

    async fn get_active_cart(&self, user_id: &str) -> RepoResult<Option<Cart>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT *, record::id(id) AS id FROM {} \
                 WHERE user_id = $uid AND status = $active LIMIT 1",
                CART
            ))
            .bind(("uid", user_id.to_string()))
            .bind(("active", CartStatus::Active))
            .await?;
        let rows: Vec<Cart> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn create_cart(&self, cart: Cart) -> RepoResult<()> {
        self.create_keyed(CART, &cart.id, &cart).await
    }

    async fn update_cart(&self, cart: Cart) -> RepoResult<()> {
        // The status field doubles as the active-cart pointer, so a single
        // record write is atomic for the contract. Only the first transition
        // out of Active wins when checkouts race.
        if cart.status == CartStatus::CheckedOut {
            let stored: Cart = self
                .get_keyed(CART, &cart.id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("cart {}", cart.id)))?;
            if stored.status != CartStatus::Active {
                return Err(RepoError::Conflict(format!(
                    "cart {} already checked out",
                    cart.id
                )));
            }
        }
        self.update_keyed(CART, &cart.id, &cart).await
    }

    async fn add_cart_item(&self, cart_id: &str, item: CartItem) -> RepoResult<Cart> {
        let mut cart: Cart = self
            .get_keyed(CART, cart_id)
            .await?
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
        self.upsert_keyed(CART, cart_id, &cart).await?;
        Ok(cart)
    }

    async fn update_cart_item(
        &self,
        cart_id: &str,
        collectible_id: &str,
        item: CartItem,
    ) -> RepoResult<Cart> {
        let mut cart: Cart = self
            .get_keyed(CART, cart_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("cart {}", cart_id)))?;

        let existing = cart
            .items
            .iter_mut()
            .find(|i| i.collectible_id == collectible_id)
            .ok_or_else(|| RepoError::NotFound(format!("cart item {}", collectible_id)))?;
        *existing = item;
        cart.updated_at = now_millis();
        self.upsert_keyed(CART, cart_id, &cart).await?;
        Ok(cart)
    }

    async fn remove_cart_item(&self, cart_id: &str, collectible_id: &str) -> RepoResult<Cart> {
        let mut cart: Cart = self
            .get_keyed(CART, cart_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("cart {}", cart_id)))?;

        let before = cart.items.len();
        cart.items.retain(|i| i.collectible_id != collectible_id);
        if cart.items.len() == before {
            return Err(RepoError::NotFound(format!("cart item {}", collectible_id)));
        }
        cart.updated_at = now_millis();
        self.upsert_keyed(CART, cart_id, &cart).await?;
        Ok(cart)
    }

    // ==================== Orders ====================

    async fn create_order(&self, order: Order) -> RepoResult<()> {
        self.create_keyed(ORDER, &order.id, &order).await
    }

    async fn get_order(&self, id: &str) -> RepoResult<Option<Order>> {
        self.get_keyed(ORDER, id).await
    }

    async fn get_orders_by_user(&self, user_id: &str) -> RepoResult<Vec<Order>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT *, record::id(id) AS id FROM {} \
                 WHERE user_id = $uid ORDER BY created_at ASC",
                ORDER
            ))
            .bind(("uid", user_id.to_string()))
            .await?;
        Ok(result.take(0)?)
    }

    async fn get_all_orders(&self) -> RepoResult<Vec<Order>> {
        self.get_all(ORDER).await
    }

    async fn update_order_status(&self, id: &str, status: OrderStatus) -> RepoResult<Order> {
        // Conditional update: only statuses that may legally transition to
        // the target qualify, so a racing writer cannot clobber the record
        let allowed: Vec<OrderStatus> = [
            OrderStatus::PendingPayment,
            OrderStatus::Paid,
            OrderStatus::Allocated,
            OrderStatus::InTransit,
            OrderStatus::ReadyForPickup,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ]
        .into_iter()
        .filter(|from| from.can_transition_to(status))
        .collect();

        let mut result = self
            .db
            .query(
                "UPDATE $record SET status = $status, updated_at = $now \
                 WHERE status IN $allowed \
                 RETURN *, record::id(id) AS id",
            )
            .bind(("record", RecordId::from_table_key(ORDER, id)))
            .bind(("status", status))
            .bind(("now", now_millis()))
            .bind(("allowed", allowed))
            .await?;
        let rows: Vec<Order> = result.take(0)?;

        match rows.into_iter().next() {
            Some(order) => Ok(order),
            None => {
                if self.get_order(id).await?.is_some() {
                    Err(RepoError::InvalidTransition(format!(
                        "order {} cannot move to {:?}",
                        id, status
                    )))
                } else {
                    Err(RepoError::NotFound(format!("order {}", id)))
                }
            }
        }
    }

    async fn update_order(&self, order: Order) -> RepoResult<()> {
        self.update_keyed(ORDER, &order.id, &order).await
    }

    async fn find_order_by_payment(&self, payment_id: &str) -> RepoResult<Option<Order>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT *, record::id(id) AS id FROM {} WHERE payment_id = $pid LIMIT 1",
                ORDER
            ))
            .bind(("pid", payment_id.to_string()))
            .await?;
        let rows: Vec<Order> = result.take(0)?;
        Ok(rows.into_iter().next())
    }

    // ==================== Refunds ====================

    async fn create_refund(&self, refund: Refund) -> RepoResult<()> {
        if self.get_refund_by_order(&refund.order_id).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "refund for order {}",
                refund.order_id
            )));
        }
        let row = RefundRow::from_refund(&refund);
        let _: Option<serde_json::Value> = self
            .db
            .create(RecordId::from_table_key(REFUND, &refund.order_id))
            .content(row)
            .await?;
        Ok(())
    }

    async fn get_refund_by_order(&self, order_id: &str) -> RepoResult<Option<Refund>> {
        let row: Option<RefundRow> = self
            .db
            .select(RecordId::from_table_key(REFUND, order_id))
            .await?;
        Ok(row.map(|r| r.into_refund(order_id)))
    }

    async fn update_refund(&self, refund: Refund) -> RepoResult<()> {
        let row = RefundRow::from_refund(&refund);
        let _: Option<serde_json::Value> = self
            .db
            .upsert(RecordId::from_table_key(REFUND, &refund.order_id))
            .content(row)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Size;

    #[tokio::test]
    async fn test_collectible_round_trip() {
        let repo = SurrealRepository::open_in_memory().await.unwrap();
        repo.add_collectible(Collectible {
            id: "col-001".into(),
            name: "Batman".into(),
            description: "Rare figure".into(),
            size: Size::S,
            image_url: "/images/batman.jpg".into(),
            available: true,
        })
        .await
        .unwrap();

        let found = repo.get_collectible("col-001").await.unwrap().unwrap();
        assert_eq!(found.id, "col-001");
        assert_eq!(found.name, "Batman");
        assert!(repo.get_collectible("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_rental_rejected() {
        let repo = SurrealRepository::open_in_memory().await.unwrap();
        let rental = sample_rental("rent-1");
        repo.create_rental(rental.clone()).await.unwrap();

        let err = repo.create_rental(rental).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_pending_rental_lookup() {
        let repo = SurrealRepository::open_in_memory().await.unwrap();
        repo.create_rental(sample_rental("rent-1")).await.unwrap();

        let found = repo
            .find_pending_rental("a@example.com", "col-001")
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, "rent-1");

        let missing = repo
            .find_pending_rental("b@example.com", "col-001")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_refund_keyed_by_order() {
        let repo = SurrealRepository::open_in_memory().await.unwrap();
        let refund = Refund {
            id: "ref-1".into(),
            order_id: "order-1".into(),
            user_id: "u1".into(),
            amount: 500.0,
            reason: "test".into(),
            status: RefundStatus::Pending,
            created_at: 1,
            updated_at: 1,
        };
        repo.create_refund(refund.clone()).await.unwrap();

        let found = repo.get_refund_by_order("order-1").await.unwrap().unwrap();
        assert_eq!(found.id, "ref-1");
        assert_eq!(found.order_id, "order-1");

        let err = repo
            .create_refund(Refund {
                id: "ref-2".into(),
                ..refund
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    fn sample_rental(id: &str) -> Rental {
        Rental {
            id: id.into(),
            collectible_id: "col-001".into(),
            collectible_name: "Batman".into(),
            store_id: "store-a".into(),
            warehouse_id: "wh-001-1".into(),
            customer: crate::models::Customer {
                name: "Alice".into(),
                email: "a@example.com".into(),
                phone: String::new(),
                address: String::new(),
                city: String::new(),
                postal_code: String::new(),
            },
            duration: 7,
            daily_rate: 1000.0,
            total_fee: 7000.0,
            payment_method: crate::models::PaymentMethod::Card,
            payment_status: PaymentStatus::Pending,
            payment_id: "pay-1".into(),
            payment_url: String::new(),
            eta: 1,
            created_at: 1,
            updated_at: 1,
        }
    }
}
