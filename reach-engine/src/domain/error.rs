//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from collaborator and engine errors.

use super::{LocationId, TripId};

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// A trip's stop times are malformed
    #[error("invalid trip {trip}: {reason}")]
    InvalidTrip { trip: TripId, reason: &'static str },

    /// Consecutive movements don't share an endpoint
    #[error("movements are not connected: {0} then {1}")]
    MovementsNotConnected(LocationId, LocationId),

    /// A movement ends after the next one starts, or ends before it starts
    #[error("movement times go backwards at {0}")]
    TimesOutOfOrder(LocationId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidTrip {
            trip: TripId(3),
            reason: "a trip needs at least two stop times",
        };
        assert_eq!(
            err.to_string(),
            "invalid trip TripId(3): a trip needs at least two stop times"
        );

        let err = DomainError::MovementsNotConnected(LocationId(1), LocationId(2));
        assert_eq!(
            err.to_string(),
            "movements are not connected: LocationId(1) then LocationId(2)"
        );

        let err = DomainError::TimesOutOfOrder(LocationId(5));
        assert_eq!(err.to_string(), "movement times go backwards at LocationId(5)");
    }
}
