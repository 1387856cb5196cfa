//! Domain model
//!
//! Entity definitions shared by the allocation manager, the checkout
//! services, and the repository backends. Request/response payloads live
//! next to the handlers that accept them.

pub mod cart;
pub mod collectible;
pub mod order;
pub mod refund;
pub mod rental;
pub mod user;
pub mod warehouse;

pub use cart::{Cart, CartItem, CartStatus};
pub use collectible::{Collectible, Size, Store};
pub use order::{Order, OrderItem, OrderStatus};
pub use refund::{Refund, RefundStatus};
pub use rental::{Customer, PaymentMethod, PaymentStatus, Rental};
pub use user::User;
pub use warehouse::{CollectibleUnit, UnitState, Warehouse};
