//! Inventory allocation
//!
//! - [`AllocationManager`]: single writer to physical unit state; nearest-
//!   warehouse selection, reservations, expiry, startup reconciliation
//! - [`ReservationSweeper`]: periodic background task bounding reservation
//!   lifetime

mod manager;
mod sweeper;

pub use manager::{Allocated, AllocationError, AllocationManager};
pub use sweeper::ReservationSweeper;

use crate::error::{AppError, ErrorCode};

impl From<AllocationError> for AppError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::NoCapacity => AppError::new(ErrorCode::NoCapacity),
            AllocationError::UnknownStore(store) => {
                AppError::new(ErrorCode::UnknownStore).with_detail("store_id", store)
            }
            AllocationError::NotReserved => AppError::new(ErrorCode::UnitNotReserved),
        }
    }
}
