//! Cooperative cancellation for long-running builds and searches

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Raised at a checkpoint once cancellation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled before {phase}")]
pub struct Cancelled {
    /// Phase that was about to start.
    pub phase: &'static str,
}

/// Shared flag polled between the major phases of a build or search.
///
/// Clones share the same flag; cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with [`Cancelled`] if cancellation was requested.
    pub fn checkpoint(&self, phase: &'static str) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled { phase })
        } else {
            Ok(())
        }
    }
}
