use std::error::Error as StdError;

use thiserror::Error;

use crate::lock::LockError;

/// SQLSTATE class 23 codes that signal a uniqueness violation.
const UNIQUE_VIOLATION_CODES: &[&str] = &["23000", "23505"];

/// Error reported by a backing store (event stream repository or index store).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A row with the same identity already exists.
    #[error("unique constraint violated for {key}")]
    UniqueViolation { key: String },
    #[error("concurrent write detected for entity {id} (expected version {expected}, got {actual})")]
    ConcurrentWrite {
        id: String,
        expected: u64,
        actual: u64,
    },
    #[error("cannot revert {id} to version {target} (current version {current})")]
    InvalidRevert {
        id: String,
        target: u64,
        current: u64,
    },
    #[error("{id} not found")]
    NotFound { id: String },
    #[error("replay error: {0}")]
    Replay(String),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("repository lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// An error from a store driver, optionally carrying a vendor/SQLSTATE code.
    #[error("backend error: {message}")]
    Backend {
        message: String,
        code: Option<String>,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl RepositoryError {
    pub fn backend(message: impl Into<String>) -> Self {
        RepositoryError::Backend {
            message: message.into(),
            code: None,
            source: None,
        }
    }

    pub fn backend_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        RepositoryError::Backend {
            message: message.into(),
            code: Some(code.into()),
            source: None,
        }
    }

    /// Wrap a driver error.
    pub fn from_source<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        RepositoryError::Backend {
            message: source.to_string(),
            code: None,
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error means "a row with this identity already exists".
    pub fn is_unique_violation(&self) -> bool {
        match self {
            RepositoryError::UniqueViolation { .. } => true,
            RepositoryError::Backend {
                code: Some(code), ..
            } => UNIQUE_VIOLATION_CODES.contains(&code.as_str()),
            _ => false,
        }
    }
}

/// What went wrong underneath a provider operation.
#[derive(Debug, Error)]
pub enum AccessFailure {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AccessFailure {
    pub fn as_repository(&self) -> Option<&RepositoryError> {
        match self {
            AccessFailure::Repository(err) => Some(err),
            AccessFailure::Lock(_) => None,
        }
    }

    pub fn as_lock(&self) -> Option<&LockError> {
        match self {
            AccessFailure::Lock(err) => Some(err),
            AccessFailure::Repository(_) => None,
        }
    }
}
