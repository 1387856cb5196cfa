//! Warehouse and physical unit models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A storage location holding units of a collectible
///
/// `serves` maps store id to distance in kilometers. Every store known to the
/// system must appear in every warehouse's map; this is validated at startup
/// and a violation is fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: String,
    pub name: String,
    pub collectible_id: String,
    /// Store id -> distance (km)
    pub serves: HashMap<String, u32>,
}

/// Lifecycle state of a physical unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitState {
    /// Free for allocation
    Available,
    /// Held under a time-bounded reservation pending payment
    Reserved,
    /// Durably assigned after a successful payment; never swept
    Committed,
}

/// A specific physical instance of a collectible in a warehouse
///
/// Internal-facing; the customer never sees the unit id. The allocation
/// manager is the single writer to unit state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectibleUnit {
    pub id: String,
    pub collectible_id: String,
    pub warehouse_id: String,
    pub state: UnitState,
    /// Set while `state == Reserved` (Unix millis)
    pub reserved_at: Option<i64>,
    /// The order/rental id holding the reservation
    pub reservation_id: Option<String>,
}

impl CollectibleUnit {
    /// Create a fresh available unit
    pub fn available(id: impl Into<String>, collectible_id: impl Into<String>, warehouse_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            collectible_id: collectible_id.into(),
            warehouse_id: warehouse_id.into(),
            state: UnitState::Available,
            reserved_at: None,
            reservation_id: None,
        }
    }

    /// Clear reservation metadata and return the unit to the available pool
    pub fn release(&mut self) {
        self.state = UnitState::Available;
        self.reserved_at = None;
        self.reservation_id = None;
    }
}
