//! Rental fee calculation
//!
//! Pure function of `(size, duration)`. Rentals shorter than the minimum
//! duration pay a doubled daily rate.

use crate::models::Size;

/// Minimum rental duration (days) before the special rate kicks in
pub const MINIMUM_RENTAL_DAYS: u32 = 7;

/// Daily-rate multiplier applied below the minimum duration
pub const SPECIAL_RATE_MULTIPLIER: f64 = 2.0;

/// Calculated rental fee
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentalFee {
    /// Effective daily rate (base, or doubled under the special rate)
    pub daily_rate: f64,
    /// `daily_rate × duration`
    pub total_fee: f64,
    /// Whether the short-rental special rate was applied
    pub is_special_rate: bool,
}

/// Calculate the rental fee for a size and duration
///
/// `duration` must be >= 1; the HTTP boundary rejects anything else.
pub fn calculate_rental_fee(size: Size, duration: u32) -> RentalFee {
    let base_rate = size.daily_rate();

    let is_special_rate = duration < MINIMUM_RENTAL_DAYS;
    let daily_rate = if is_special_rate {
        base_rate * SPECIAL_RATE_MULTIPLIER
    } else {
        base_rate
    };

    RentalFee {
        daily_rate,
        total_fee: daily_rate * duration as f64,
        is_special_rate,
    }
}
