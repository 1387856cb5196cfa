//! Unified error codes for the rental server
//!
//! Error codes are shared between the API layer and the frontend.
//! They are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Cart errors
//! - 4xxx: Order / rental errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors
//! - 7xxx: Allocation errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Session token is invalid or expired
    TokenInvalid = 1003,
    /// Email is already registered
    EmailAlreadyRegistered = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied (resource owned by another user)
    PermissionDenied = 2001,

    // ==================== 3xxx: Cart ====================
    /// No active cart for the user
    CartNotFound = 3001,
    /// Cart has no items
    CartEmpty = 3002,
    /// Item not found in cart
    CartItemNotFound = 3003,

    // ==================== 4xxx: Order / Rental ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order status forbids cancellation
    OrderNotCancellable = 4002,
    /// Order status transition not allowed
    OrderInvalidTransition = 4003,
    /// Rental not found
    RentalNotFound = 4101,
    /// Rental id already exists
    RentalAlreadyExists = 4102,

    // ==================== 5xxx: Payment ====================
    /// Payment gateway refused or failed
    PaymentFailed = 5001,
    /// Checkout session creation failed
    PaymentSessionFailed = 5002,
    /// Refund processing failed
    RefundFailed = 5003,
    /// No refund exists for the order
    RefundNotFound = 5004,

    // ==================== 6xxx: Catalog ====================
    /// Collectible not found
    CollectibleNotFound = 6001,
    /// No warehouses registered for the collectible
    WarehouseNotFound = 6101,

    // ==================== 7xxx: Allocation ====================
    /// No available unit for the collectible
    NoCapacity = 7001,
    /// No warehouse serves the requested store
    UnknownStore = 7002,
    /// Unit is not in the reserved state
    UnitNotReserved = 7003,
    /// One or more cart items could not be allocated
    PartialAllocation = 7004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenInvalid => "Invalid or expired token",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",

            // Permission
            ErrorCode::PermissionDenied => "Access denied",

            // Cart
            ErrorCode::CartNotFound => "No active cart found",
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::CartItemNotFound => "Item not found in cart",

            // Order / Rental
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderNotCancellable => "Order cannot be cancelled",
            ErrorCode::OrderInvalidTransition => "Order status transition not allowed",
            ErrorCode::RentalNotFound => "Rental not found",
            ErrorCode::RentalAlreadyExists => "Rental already exists",

            // Payment
            ErrorCode::PaymentFailed => "Payment failed",
            ErrorCode::PaymentSessionFailed => "Failed to create payment session",
            ErrorCode::RefundFailed => "Failed to process refund",
            ErrorCode::RefundNotFound => "No refund found for this order",

            // Catalog
            ErrorCode::CollectibleNotFound => "Collectible not found",
            ErrorCode::WarehouseNotFound => "No warehouses found for collectible",

            // Allocation
            ErrorCode::NoCapacity => "No available units found for the selected collectible",
            ErrorCode::UnknownStore => "No warehouse serves the requested store",
            ErrorCode::UnitNotReserved => "Unit not found or already available",
            ErrorCode::PartialAllocation => "Some items could not be allocated",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.code(), self.message())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenInvalid),
            1004 => Ok(ErrorCode::EmailAlreadyRegistered),
            2001 => Ok(ErrorCode::PermissionDenied),
            3001 => Ok(ErrorCode::CartNotFound),
            3002 => Ok(ErrorCode::CartEmpty),
            3003 => Ok(ErrorCode::CartItemNotFound),
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderNotCancellable),
            4003 => Ok(ErrorCode::OrderInvalidTransition),
            4101 => Ok(ErrorCode::RentalNotFound),
            4102 => Ok(ErrorCode::RentalAlreadyExists),
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentSessionFailed),
            5003 => Ok(ErrorCode::RefundFailed),
            5004 => Ok(ErrorCode::RefundNotFound),
            6001 => Ok(ErrorCode::CollectibleNotFound),
            6101 => Ok(ErrorCode::WarehouseNotFound),
            7001 => Ok(ErrorCode::NoCapacity),
            7002 => Ok(ErrorCode::UnknownStore),
            7003 => Ok(ErrorCode::UnitNotReserved),
            7004 => Ok(ErrorCode::PartialAllocation),
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9005 => Ok(ErrorCode::ConfigError),
            other => Err(format!("Unknown error code: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_value() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::NoCapacity.code(), 7001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_round_trip_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::CartEmpty,
            ErrorCode::NoCapacity,
            ErrorCode::PartialAllocation,
            ErrorCode::DatabaseError,
        ] {
            let value: u16 = code.into();
            assert_eq!(ErrorCode::try_from(value).unwrap(), code);
        }
    }

    #[test]
    fn test_try_from_unknown() {
        assert!(ErrorCode::try_from(60000).is_err());
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::NoCapacity).unwrap();
        assert_eq!(json, "7001");
    }
}
