//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::EngineError;

/// A shared cancellation flag.
///
/// Clones share the flag. Once raised it stays raised; the engine checks
/// it at round boundaries and before starting each task group.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this flag to stop.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `Err(Interrupted)` once the flag is raised.
    pub fn check(&self) -> Result<(), EngineError> {
        if self.is_raised() {
            Err(EngineError::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_flag() {
        let a = Interrupt::new();
        let b = a.clone();
        assert!(a.check().is_ok());

        b.raise();
        assert!(a.is_raised());
        assert!(matches!(a.check(), Err(EngineError::Interrupted)));
    }
}
