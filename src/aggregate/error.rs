use thiserror::Error;

use super::AggregateId;
use crate::error::{AccessFailure, RepositoryError};

/// Failure of an [`AggregateAccessProvider`](super::AggregateAccessProvider) call.
///
/// Every variant keeps the underlying lock or repository error as its source.
#[derive(Debug, Error)]
pub enum AggregateAccessError {
    #[error("failed to load aggregate {id}: {source}")]
    LoadFailed {
        id: AggregateId,
        #[source]
        source: AccessFailure,
    },
    #[error("failed to save aggregate {id}: {source}")]
    SaveFailed {
        id: AggregateId,
        #[source]
        source: AccessFailure,
    },
    /// The insert path hit an existing stream this provider did not know about.
    #[error("aggregate {id} already exists: {source}")]
    DuplicateAggregate {
        id: AggregateId,
        #[source]
        source: RepositoryError,
    },
    #[error("failed to revert aggregate {id} to version {to_version}: {source}")]
    RevertFailed {
        id: AggregateId,
        to_version: u64,
        #[source]
        source: AccessFailure,
    },
}

impl AggregateAccessError {
    pub(crate) fn load_failed(id: &AggregateId, source: impl Into<AccessFailure>) -> Self {
        AggregateAccessError::LoadFailed {
            id: id.clone(),
            source: source.into(),
        }
    }

    pub(crate) fn save_failed(id: &AggregateId, source: impl Into<AccessFailure>) -> Self {
        AggregateAccessError::SaveFailed {
            id: id.clone(),
            source: source.into(),
        }
    }

    pub(crate) fn revert_failed(
        id: &AggregateId,
        to_version: u64,
        source: impl Into<AccessFailure>,
    ) -> Self {
        AggregateAccessError::RevertFailed {
            id: id.clone(),
            to_version,
            source: source.into(),
        }
    }

    pub fn id(&self) -> &AggregateId {
        match self {
            AggregateAccessError::LoadFailed { id, .. }
            | AggregateAccessError::SaveFailed { id, .. }
            | AggregateAccessError::DuplicateAggregate { id, .. }
            | AggregateAccessError::RevertFailed { id, .. } => id,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, AggregateAccessError::DuplicateAggregate { .. })
    }

    /// The repository error underneath, if the failure came from the repository.
    pub fn repository_error(&self) -> Option<&RepositoryError> {
        match self {
            AggregateAccessError::DuplicateAggregate { source, .. } => Some(source),
            AggregateAccessError::LoadFailed { source, .. }
            | AggregateAccessError::SaveFailed { source, .. }
            | AggregateAccessError::RevertFailed { source, .. } => source.as_repository(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::lock::LockError;

    #[test]
    fn duplicate_keeps_repository_cause() {
        let err = AggregateAccessError::DuplicateAggregate {
            id: AggregateId::from("a1"),
            source: RepositoryError::UniqueViolation { key: "a1".into() },
        };
        assert!(err.is_duplicate());
        assert_eq!(err.id().as_str(), "a1");
        assert!(err.repository_error().unwrap().is_unique_violation());
        assert_eq!(
            err.to_string(),
            "aggregate a1 already exists: unique constraint violated for a1"
        );
    }

    #[test]
    fn lock_failure_has_no_repository_error() {
        let err = AggregateAccessError::load_failed(
            &AggregateId::from("a1"),
            LockError::AcquireFailed("busy".into()),
        );
        assert!(!err.is_duplicate());
        assert!(err.repository_error().is_none());
        assert_eq!(err.source().unwrap().to_string(), "lock acquire failed: busy");
    }
}
