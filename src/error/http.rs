//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::CartNotFound
            | Self::CartItemNotFound
            | Self::OrderNotFound
            | Self::RentalNotFound
            | Self::RefundNotFound
            | Self::CollectibleNotFound
            | Self::WarehouseNotFound
            | Self::UnknownStore => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::EmailAlreadyRegistered
            | Self::RentalAlreadyExists
            | Self::NoCapacity
            | Self::UnitNotReserved
            | Self::PartialAllocation => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::InvalidCredentials | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::PermissionDenied => StatusCode::FORBIDDEN,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::PaymentFailed
            | Self::PaymentSessionFailed
            | Self::RefundFailed => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::CollectibleNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(ErrorCode::NoCapacity.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::PartialAllocation.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::EmailAlreadyRegistered.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_unauthorized_status() {
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorCode::TokenInvalid.http_status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_not_cancellable_is_bad_request() {
        assert_eq!(
            ErrorCode::OrderNotCancellable.http_status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_payment_errors_are_internal() {
        assert_eq!(
            ErrorCode::PaymentSessionFailed.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
