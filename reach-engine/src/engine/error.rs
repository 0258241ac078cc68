//! Engine error types.

use crate::domain::{DomainError, LocationId, RouteId, Time};
use crate::network::ScheduleError;
use crate::reachability::ReachError;

/// Errors that abort a table build, a range run or a whole execution.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Cooperative cancellation was requested
    #[error("calculation interrupted")]
    Interrupted,

    /// The origin is not a location of the calculation's arena
    #[error("origin {0} is outside the network")]
    OriginOutsideNetwork(LocationId),

    /// A transit hop uses a route the network has no details for
    #[error("route {0} has no details in the transit network")]
    MissingRouteDetails(RouteId),

    /// A build kept finding improvements past its round limit
    #[error("no fixed point after {limit} rounds from {origin}")]
    RoundLimitExceeded { origin: LocationId, limit: usize },

    /// A predecessor chain does not terminate at the origin
    #[error("predecessor chain from {0} does not reach the origin")]
    BrokenPredecessorChain(LocationId),

    /// A task group's times are not in search order
    #[error("query time {next} does not follow {previous} in search order")]
    UnorderedTimes { previous: Time, next: Time },

    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("walking reachability error: {0}")]
    Reach(#[from] ReachError),

    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The worker pool could not be started
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// Workers went away before reporting every task group
    #[error("{pending} task groups never reported back")]
    WorkerLost { pending: usize },

    /// A task group failed; siblings ran to completion
    #[error("task group {origin}/{run} failed: {source}")]
    TaskGroupFailed {
        origin: LocationId,
        run: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Convert a schedule error, keeping interruption distinct.
    pub fn from_schedule(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Interrupted => EngineError::Interrupted,
            other => EngineError::Schedule(other),
        }
    }

    /// Convert a walking reachability error, keeping interruption distinct.
    pub fn from_reach(err: ReachError) -> Self {
        match err {
            ReachError::Interrupted => EngineError::Interrupted,
            other => EngineError::Reach(other),
        }
    }

    /// Returns true if this error, or the task group failure it wraps, is
    /// an interruption.
    pub fn is_interrupted(&self) -> bool {
        match self {
            EngineError::Interrupted => true,
            EngineError::TaskGroupFailed { source, .. } => source.is_interrupted(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaborator_interrupts_stay_interrupts() {
        assert!(matches!(
            EngineError::from_schedule(ScheduleError::Interrupted),
            EngineError::Interrupted
        ));
        assert!(matches!(
            EngineError::from_reach(ReachError::Interrupted),
            EngineError::Interrupted
        ));
        assert!(matches!(
            EngineError::from_reach(ReachError::UnknownLocation(LocationId(3))),
            EngineError::Reach(_)
        ));
    }

    #[test]
    fn wrapped_interrupt_is_detected() {
        let err = EngineError::TaskGroupFailed {
            origin: LocationId(1),
            run: "am-peak".into(),
            source: Box::new(EngineError::Interrupted),
        };
        assert!(err.is_interrupted());
        assert!(!EngineError::WorkerLost { pending: 2 }.is_interrupted());
    }

    #[test]
    fn error_display() {
        let err = EngineError::RoundLimitExceeded {
            origin: LocationId(4),
            limit: 12,
        };
        assert_eq!(err.to_string(), "no fixed point after 12 rounds from LocationId(4)");

        let err = EngineError::MissingRouteDetails(RouteId(7));
        assert_eq!(err.to_string(), "route RouteId(7) has no details in the transit network");
    }
}
