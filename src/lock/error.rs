use std::time::Duration;

use thiserror::Error;

/// Error type for lock operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// The underlying lock primitive was poisoned (e.g. a thread panicked while holding it).
    #[error("lock poisoned: {0}")]
    Poisoned(String),
    /// Failed to acquire the lock.
    #[error("lock acquire failed: {0}")]
    AcquireFailed(String),
    /// Failed to release the lock.
    #[error("lock release failed: {0}")]
    ReleaseFailed(String),
    /// The lock could not be acquired within the configured window.
    #[error("lock {key} not acquired within {after:?}")]
    Timeout { key: String, after: Duration },
    /// Any other lock error.
    #[error("lock error: {0}")]
    Other(String),
}
