//! Unified error system for the rental server
//!
//! - [`ErrorCode`]: standardized error codes for all error types
//! - [`ErrorCategory`]: classification of errors by domain
//! - [`AppError`]: rich error type with codes, messages, and details
//! - [`ApiResponse`]: unified API response envelope `{ success, data?, error? }`
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Cart errors
//! - 4xxx: Order / rental errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors
//! - 7xxx: Allocation errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use rental_server::error::{ApiResponse, AppError, ErrorCode};
//!
//! // Create a simple error
//! let err = AppError::new(ErrorCode::NoCapacity);
//!
//! // Create an error with custom message
//! let err = AppError::with_message(ErrorCode::ValidationFailed, "Invalid email format");
//!
//! // Convert to API response
//! let response = ApiResponse::error(&err);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::ErrorCode;
pub use types::{ApiResponse, AppError, AppResult};
