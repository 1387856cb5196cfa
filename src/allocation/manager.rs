//! AllocationManager - unit-level inventory and reservations
//!
//! Single writer to [`CollectibleUnit`] state. All operations serialize on
//! one process-wide mutex; critical sections are O(units) and short.
//!
//! # Unit state machine
//!
//! ```text
//! Available ──allocate──▶ Reserved ──confirm──▶ Committed ──release(cancel)──▶ Available
//!     ▲                      │
//!     └──release / sweep─────┘
//! ```
//!
//! Expired reservations are swept both in-line (at the start of every
//! `allocate`) and by the periodic [`ReservationSweeper`]; the sweep is
//! idempotent so running both is safe.
//!
//! [`ReservationSweeper`]: super::ReservationSweeper

use crate::models::{CollectibleUnit, Order, Rental, UnitState, Warehouse};
use crate::models::{OrderStatus, PaymentStatus};
use crate::util::now_millis;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Allocation failure modes
///
/// `NoCapacity` is a normal outcome surfaced to the caller as a 409; the
/// others indicate caller mistakes or stale identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("no available units found for the selected collectible")]
    NoCapacity,
    #[error("no warehouse serves store {0}")]
    UnknownStore(String),
    #[error("unit not found or already available")]
    NotReserved,
}

/// A successful allocation: the reserved unit and its distance to the store
#[derive(Debug, Clone)]
pub struct Allocated {
    pub unit: CollectibleUnit,
    /// Distance (km) from the unit's warehouse to the requested store,
    /// interpreted downstream as delivery days
    pub distance: u32,
}

struct Inventory {
    units: Vec<CollectibleUnit>,
    warehouses: HashMap<String, Warehouse>,
}

/// Owns unit-level inventory; serializes reserve/release/expire
pub struct AllocationManager {
    inner: Mutex<Inventory>,
    reservation_timeout: Duration,
}

impl AllocationManager {
    /// Create a manager owning the given units and warehouses
    pub fn new(
        units: Vec<CollectibleUnit>,
        warehouses: Vec<Warehouse>,
        reservation_timeout: Duration,
    ) -> Self {
        let warehouses: HashMap<String, Warehouse> =
            warehouses.into_iter().map(|w| (w.id.clone(), w)).collect();
        tracing::info!(
            units = units.len(),
            warehouses = warehouses.len(),
            "AllocationManager initialized"
        );
        Self {
            inner: Mutex::new(Inventory { units, warehouses }),
            reservation_timeout,
        }
    }

    /// Select and reserve the nearest available unit of a collectible
    ///
    /// Sweeps expired reservations in-line before searching. Among available
    /// units of the collectible whose warehouse serves `store_id`, picks the
    /// minimal distance; ties break on unit id ascending so the choice is
    /// deterministic.
    pub fn allocate(
        &self,
        collectible_id: &str,
        store_id: &str,
        reservation_id: &str,
    ) -> Result<Allocated, AllocationError> {
        let mut inv = self.inner.lock();
        let now = now_millis();
        Self::sweep_expired(&mut inv, now, self.reservation_timeout);

        tracing::debug!(
            collectible_id,
            store_id,
            reservation_id,
            "Starting allocation"
        );

        if !inv
            .warehouses
            .values()
            .any(|w| w.serves.contains_key(store_id))
        {
            tracing::warn!(store_id, "No warehouse serves the requested store");
            return Err(AllocationError::UnknownStore(store_id.to_string()));
        }

        let mut best: Option<(usize, u32)> = None;
        for (idx, unit) in inv.units.iter().enumerate() {
            if unit.collectible_id != collectible_id || unit.state != UnitState::Available {
                continue;
            }
            let Some(warehouse) = inv.warehouses.get(&unit.warehouse_id) else {
                tracing::error!(
                    unit_id = %unit.id,
                    warehouse_id = %unit.warehouse_id,
                    "Unit linked to unknown warehouse"
                );
                continue;
            };
            let Some(&dist) = warehouse.serves.get(store_id) else {
                continue;
            };

            let closer = match best {
                None => true,
                Some((best_idx, best_dist)) => {
                    dist < best_dist || (dist == best_dist && unit.id < inv.units[best_idx].id)
                }
            };
            if closer {
                best = Some((idx, dist));
            }
        }

        let Some((idx, distance)) = best else {
            tracing::info!(collectible_id, "Allocation failed: no available units");
            return Err(AllocationError::NoCapacity);
        };

        let unit = &mut inv.units[idx];
        unit.state = UnitState::Reserved;
        unit.reserved_at = Some(now);
        unit.reservation_id = Some(reservation_id.to_string());
        tracing::info!(
            unit_id = %unit.id,
            warehouse_id = %unit.warehouse_id,
            distance,
            reservation_id,
            "Unit allocated"
        );

        Ok(Allocated {
            unit: unit.clone(),
            distance,
        })
    }

    /// Return a held unit of a collectible in a warehouse to the pool
    ///
    /// Prefers the unit whose reservation matches `reservation_id`; falls
    /// back to any held unit of the pair when the caller cannot name one.
    /// Both `Reserved` and `Committed` units qualify; a committed unit only
    /// ever leaves that state through this explicit release (cancellation).
    pub fn release_unit(
        &self,
        collectible_id: &str,
        warehouse_id: &str,
        reservation_id: Option<&str>,
    ) -> Result<(), AllocationError> {
        let mut inv = self.inner.lock();

        let held = |u: &CollectibleUnit| {
            u.collectible_id == collectible_id
                && u.warehouse_id == warehouse_id
                && u.state != UnitState::Available
        };

        let matched = reservation_id.and_then(|rid| {
            inv.units
                .iter()
                .position(|u| held(u) && u.reservation_id.as_deref() == Some(rid))
        });
        let idx = matched.or_else(|| inv.units.iter().position(held));

        match idx {
            Some(idx) => {
                let unit = &mut inv.units[idx];
                unit.release();
                tracing::info!(
                    unit_id = %unit.id,
                    warehouse_id,
                    "Unit released back to inventory"
                );
                Ok(())
            }
            None => {
                tracing::warn!(
                    collectible_id,
                    warehouse_id,
                    "No held unit to release for collectible/warehouse pair"
                );
                Err(AllocationError::NotReserved)
            }
        }
    }

    /// Transition a reserved unit to committed after a successful payment
    ///
    /// Committed units are exempt from sweeping; only an explicit
    /// [`release_unit`](Self::release_unit) reverts them.
    pub fn confirm_reservation(&self, unit_id: &str) -> Result<(), AllocationError> {
        let mut inv = self.inner.lock();
        let unit = inv
            .units
            .iter_mut()
            .find(|u| u.id == unit_id && u.state == UnitState::Reserved)
            .ok_or(AllocationError::NotReserved)?;
        unit.state = UnitState::Committed;
        tracing::info!(unit_id = %unit.id, "Reservation confirmed");
        Ok(())
    }

    /// Confirm every unit reserved under a reservation id
    ///
    /// Used by payment reconciliation, which knows the order/rental id but
    /// not the unit ids. Returns the number of units confirmed.
    pub fn confirm_for_reservation(&self, reservation_id: &str) -> usize {
        let mut inv = self.inner.lock();
        let mut confirmed = 0;
        for unit in inv
            .units
            .iter_mut()
            .filter(|u| u.state == UnitState::Reserved)
        {
            if unit.reservation_id.as_deref() == Some(reservation_id) {
                unit.state = UnitState::Committed;
                confirmed += 1;
            }
        }
        if confirmed > 0 {
            tracing::info!(reservation_id, confirmed, "Reservations confirmed");
        }
        confirmed
    }

    /// Number of available units for a collectible
    pub fn get_total_stock(&self, collectible_id: &str) -> usize {
        let inv = self.inner.lock();
        inv.units
            .iter()
            .filter(|u| u.collectible_id == collectible_id && u.state == UnitState::Available)
            .count()
    }

    /// Minimum distance (delivery days) over available units of a collectible
    pub fn get_eta(&self, collectible_id: &str, store_id: &str) -> Result<u32, AllocationError> {
        let inv = self.inner.lock();
        inv.units
            .iter()
            .filter(|u| u.collectible_id == collectible_id && u.state == UnitState::Available)
            .filter_map(|u| inv.warehouses.get(&u.warehouse_id))
            .filter_map(|w| w.serves.get(store_id).copied())
            .min()
            .ok_or(AllocationError::NoCapacity)
    }

    /// Release every reservation older than the configured timeout
    ///
    /// No-op when nothing has expired. Returns the number of units released.
    pub fn sweep(&self) -> usize {
        let mut inv = self.inner.lock();
        Self::sweep_expired(&mut inv, now_millis(), self.reservation_timeout)
    }

    fn sweep_expired(inv: &mut Inventory, now: i64, timeout: Duration) -> usize {
        let cutoff = now - timeout.as_millis() as i64;
        let mut released = 0;
        for unit in &mut inv.units {
            if unit.state == UnitState::Reserved
                && unit.reserved_at.is_some_and(|at| at < cutoff)
            {
                tracing::info!(
                    unit_id = %unit.id,
                    reservation_id = ?unit.reservation_id,
                    "Releasing expired reservation"
                );
                unit.release();
                released += 1;
            }
        }
        if released > 0 {
            tracing::info!(released, "Expired reservations released");
        }
        released
    }

    /// Startup reconciliation against persisted orders
    ///
    /// Orders whose status still holds inventory re-mark their units as
    /// committed; orders awaiting payment re-mark them reserved. Without
    /// this a restart would offer already-sold units again.
    pub fn sync_from_orders(&self, orders: &[Order]) {
        let mut inv = self.inner.lock();
        let now = now_millis();
        let mut synced = 0;

        for order in orders {
            let target = if order.status.holds_inventory() {
                UnitState::Committed
            } else if order.status == OrderStatus::PendingPayment {
                UnitState::Reserved
            } else {
                continue;
            };

            for item in &order.items {
                if let Some(unit) = inv.units.iter_mut().find(|u| u.id == item.unit_id) {
                    unit.state = target;
                    unit.reservation_id = Some(order.id.clone());
                    unit.reserved_at = (target == UnitState::Reserved).then_some(now);
                    synced += 1;
                }
            }
        }

        if synced > 0 {
            tracing::info!(synced, "Inventory synced from persisted orders");
        }
    }

    /// Startup reconciliation against persisted legacy rentals
    ///
    /// Rentals identify units only by (collectible, warehouse); the first
    /// available unit of the pair takes the hold.
    pub fn sync_from_rentals(&self, rentals: &[Rental]) {
        let mut inv = self.inner.lock();
        let now = now_millis();
        let mut synced = 0;

        for rental in rentals {
            let target = match rental.payment_status {
                PaymentStatus::Pending => UnitState::Reserved,
                PaymentStatus::Completed => UnitState::Committed,
                PaymentStatus::Failed => continue,
            };

            if let Some(unit) = inv.units.iter_mut().find(|u| {
                u.collectible_id == rental.collectible_id
                    && u.warehouse_id == rental.warehouse_id
                    && u.state == UnitState::Available
            }) {
                unit.state = target;
                unit.reservation_id = Some(rental.id.clone());
                unit.reserved_at = (target == UnitState::Reserved).then_some(now);
                synced += 1;
            }
        }

        if synced > 0 {
            tracing::info!(synced, "Inventory synced from persisted rentals");
        }
    }

    /// Snapshot of all units (admin dashboard)
    pub fn snapshot_inventory(&self) -> Vec<CollectibleUnit> {
        self.inner.lock().units.clone()
    }

    /// Shift a unit's `reserved_at` back in time (expiry tests)
    #[cfg(test)]
    pub fn backdate_reservation(&self, unit_id: &str, millis: i64) {
        let mut inv = self.inner.lock();
        if let Some(unit) = inv.units.iter_mut().find(|u| u.id == unit_id) {
            unit.reserved_at = unit.reserved_at.map(|at| at - millis);
        }
    }
}
