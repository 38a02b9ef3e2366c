use std::fmt;

use thiserror::Error;

use crate::error::AccessFailure;
use crate::lock::LockKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexOperation {
    Get,
    Has,
    Add,
    Update,
    Remove,
}

impl IndexOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexOperation::Get => "get",
            IndexOperation::Has => "has",
            IndexOperation::Add => "add",
            IndexOperation::Update => "update",
            IndexOperation::Remove => "remove",
        }
    }
}

impl fmt::Display for IndexOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure of an [`IndexAccessProvider`](super::IndexAccessProvider) call.
///
/// Carries the lock key rather than the index key, so messages never repeat
/// the key's content.
#[derive(Debug, Error)]
#[error("index {operation} failed for {lock_key}: {source}")]
pub struct IndexOperationFailed {
    pub operation: IndexOperation,
    pub lock_key: LockKey,
    #[source]
    pub source: AccessFailure,
}

impl IndexOperationFailed {
    pub fn new(operation: IndexOperation, lock_key: LockKey, source: impl Into<AccessFailure>) -> Self {
        IndexOperationFailed {
            operation,
            lock_key,
            source: source.into(),
        }
    }
}
