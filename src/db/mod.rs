//! Repository port
//!
//! The capability surface the core consumes for persisted entities. Two
//! backends are selected at process start:
//! - [`MemoryRepository`]: process-local maps, all state lost on restart
//! - [`SurrealRepository`]: embedded SurrealDB, survives restarts
//!
//! Implementations must be safe under concurrent calls (readers shared,
//! writers exclusive) and must uphold the documented contracts: duplicate
//! rejection for rental ids and user emails, the active-cart pointer, and
//! status-transition legality for orders.

mod memory;
pub mod seed;
mod surreal;

pub use memory::MemoryRepository;
pub use surreal::SurrealRepository;

use crate::error::{AppError, ErrorCode};
use crate::models::{
    Cart, CartItem, Collectible, Order, OrderStatus, Refund, Rental, User, Warehouse,
};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => AppError::with_message(ErrorCode::NotFound, what),
            RepoError::Duplicate(what) => AppError::with_message(ErrorCode::AlreadyExists, what),
            // A lost cart-checkout race surfaces as a conflict
            RepoError::Conflict(what) => AppError::conflict(what),
            // An order-status CAS failure names the illegal transition
            RepoError::InvalidTransition(what) => {
                AppError::with_message(ErrorCode::OrderInvalidTransition, what)
            }
            RepoError::Database(what) => AppError::database(what),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Persisted-entity operations consumed by the core
#[async_trait]
pub trait Repository: Send + Sync {
    // ==================== Collectibles ====================

    async fn get_all_collectibles(&self) -> RepoResult<Vec<Collectible>>;
    async fn get_collectible(&self, id: &str) -> RepoResult<Option<Collectible>>;
    async fn add_collectible(&self, collectible: Collectible) -> RepoResult<()>;

    // ==================== Warehouses ====================

    async fn get_warehouses_by_collectible(&self, collectible_id: &str)
    -> RepoResult<Vec<Warehouse>>;
    async fn add_warehouse(&self, warehouse: Warehouse) -> RepoResult<()>;
    /// All warehouses grouped by collectible id
    async fn get_all_warehouses(&self) -> RepoResult<HashMap<String, Vec<Warehouse>>>;

    // ==================== Rentals ====================

    /// Fails with `Duplicate` when the rental id already exists
    async fn create_rental(&self, rental: Rental) -> RepoResult<()>;
    async fn get_rental(&self, id: &str) -> RepoResult<Option<Rental>>;
    async fn update_rental(&self, rental: Rental) -> RepoResult<()>;
    async fn get_all_rentals(&self) -> RepoResult<Vec<Rental>>;
    /// Pending rental for (customer email, collectible), the legacy
    /// checkout idempotency lookup
    async fn find_pending_rental(
        &self,
        customer_email: &str,
        collectible_id: &str,
    ) -> RepoResult<Option<Rental>>;
    /// Rental whose gateway payment/session id matches
    async fn find_rental_by_payment(&self, payment_id: &str) -> RepoResult<Option<Rental>>;
    /// Admin reset
    async fn delete_all_rentals(&self) -> RepoResult<()>;

    // ==================== Users ====================

    /// Fails with `Duplicate` when the email is already registered
    async fn create_user(&self, user: User) -> RepoResult<()>;
    async fn get_user(&self, id: &str) -> RepoResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    // ==================== Sessions ====================

    async fn create_session(&self, user_id: &str, token: &str) -> RepoResult<()>;
    /// Resolve a session token to its user id
    async fn resolve_session(&self, token: &str) -> RepoResult<Option<String>>;
    async fn delete_session(&self, token: &str) -> RepoResult<()>;

    // ==================== Carts ====================

    async fn get_active_cart(&self, user_id: &str) -> RepoResult<Option<Cart>>;
    async fn create_cart(&self, cart: Cart) -> RepoResult<()>;
    /// Contract: updating a cart out of `Active` atomically clears the
    /// user's active-cart pointer, and only the first writer moving a cart
    /// to `CheckedOut` succeeds (racing checkouts get `Conflict`)
    async fn update_cart(&self, cart: Cart) -> RepoResult<()>;
    /// Add an item, merging quantity on (collectible_id, store_id)
    async fn add_cart_item(&self, cart_id: &str, item: CartItem) -> RepoResult<Cart>;
    async fn update_cart_item(
        &self,
        cart_id: &str,
        collectible_id: &str,
        item: CartItem,
    ) -> RepoResult<Cart>;
    async fn remove_cart_item(&self, cart_id: &str, collectible_id: &str) -> RepoResult<Cart>;

    // ==================== Orders ====================

    async fn create_order(&self, order: Order) -> RepoResult<()>;
    async fn get_order(&self, id: &str) -> RepoResult<Option<Order>>;
    async fn get_orders_by_user(&self, user_id: &str) -> RepoResult<Vec<Order>>;
    async fn get_all_orders(&self) -> RepoResult<Vec<Order>>;
    /// Compare-and-set on status: the transition must be legal from the
    /// currently stored status or the call fails with `InvalidTransition`,
    /// so racing writers (webhook vs. cancel) cannot silently clobber each
    /// other
    async fn update_order_status(&self, id: &str, status: OrderStatus) -> RepoResult<Order>;
    async fn update_order(&self, order: Order) -> RepoResult<()>;
    /// Order whose gateway payment/session id matches
    async fn find_order_by_payment(&self, payment_id: &str) -> RepoResult<Option<Order>>;

    // ==================== Refunds ====================

    /// Fails with `Duplicate` when the order already has a refund
    async fn create_refund(&self, refund: Refund) -> RepoResult<()>;
    async fn get_refund_by_order(&self, order_id: &str) -> RepoResult<Option<Refund>>;
    async fn update_refund(&self, refund: Refund) -> RepoResult<()>;
}
