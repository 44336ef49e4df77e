use thiserror::Error;

/// Typed error taxonomy shared by the storage layer and the API.
///
/// Guard violations are produced inside the owning transaction; by the time
/// one of these reaches a caller the transaction has been rolled back in
/// full.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("ticket is already checked in")]
    AlreadyCheckedIn,

    #[error("no seat of the requested class is available on this flight")]
    NoSeatAvailable,

    #[error("class capacity exceeded for this flight")]
    CapacityExceeded,

    #[error("flight has already departed")]
    SaleAfterDeparture,

    #[error("assigned seat class does not match the ticket class")]
    SeatClassMismatch,

    #[error("assigned seat does not belong to the flight's aircraft")]
    AircraftMismatch,

    #[error("seat was claimed by a concurrent check-in")]
    SeatConflict,

    #[error("storage temporarily unavailable, retry later")]
    Unavailable,

    #[error("storage error: {0}")]
    Database(String),
}

impl BookingError {
    /// Stable machine-readable kind, part of the API contract.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::InvalidInput(_) => "invalid_input",
            BookingError::NotFound(_) => "not_found",
            BookingError::AlreadyCheckedIn => "already_checked_in",
            BookingError::NoSeatAvailable => "no_seat_available",
            BookingError::CapacityExceeded => "capacity_exceeded",
            BookingError::SaleAfterDeparture => "sale_after_departure",
            BookingError::SeatClassMismatch => "seat_class_mismatch",
            BookingError::AircraftMismatch => "aircraft_mismatch",
            BookingError::SeatConflict => "conflict",
            BookingError::Unavailable => "unavailable",
            BookingError::Database(_) => "internal",
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookingError::Unavailable | BookingError::SeatConflict
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable() {
        assert_eq!(BookingError::InvalidInput("x".into()).kind(), "invalid_input");
        assert_eq!(BookingError::NotFound("flight").kind(), "not_found");
        assert_eq!(BookingError::AlreadyCheckedIn.kind(), "already_checked_in");
        assert_eq!(BookingError::NoSeatAvailable.kind(), "no_seat_available");
        assert_eq!(BookingError::CapacityExceeded.kind(), "capacity_exceeded");
        assert_eq!(BookingError::SaleAfterDeparture.kind(), "sale_after_departure");
        assert_eq!(BookingError::Database("boom".into()).kind(), "internal");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(BookingError::Unavailable.is_retryable());
        assert!(BookingError::SeatConflict.is_retryable());
        assert!(!BookingError::CapacityExceeded.is_retryable());
        assert!(!BookingError::InvalidInput("x".into()).is_retryable());
    }
}
