use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Aggregate, AggregateId};
use crate::error::RepositoryError;

/// How trailing events are removed by a revert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevertMode {
    /// Flag trailing events as deleted; they stay in storage but no longer replay.
    #[default]
    #[serde(rename = "SOFT_DELETE")]
    SoftDelete,
    /// Physically remove trailing events.
    #[serde(rename = "DELETE")]
    Delete,
}

impl RevertMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevertMode::SoftDelete => "SOFT_DELETE",
            RevertMode::Delete => "DELETE",
        }
    }
}

impl fmt::Display for RevertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown revert mode {0:?} (expected SOFT_DELETE or DELETE)")]
pub struct UnknownRevertMode(pub String);

impl FromStr for RevertMode {
    type Err = UnknownRevertMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SOFT_DELETE" => Ok(RevertMode::SoftDelete),
            "DELETE" => Ok(RevertMode::Delete),
            other => Err(UnknownRevertMode(other.to_string())),
        }
    }
}

/// Persists and retrieves aggregate event streams.
///
/// `save` inserts a stream that must not exist yet and reports
/// [`RepositoryError::UniqueViolation`] (or a backend error whose
/// [`is_unique_violation`](RepositoryError::is_unique_violation) is true) when
/// it does. `update` appends to an existing stream. Both return the events
/// they just persisted.
#[async_trait]
pub trait EventStreamRepository: Send + Sync {
    type Aggregate: Aggregate;
    type Event: Clone + Send + Sync + 'static;

    async fn load(&self, id: &AggregateId) -> Result<Option<Self::Aggregate>, RepositoryError>;

    async fn save(
        &self,
        aggregate: &mut Self::Aggregate,
    ) -> Result<Vec<Self::Event>, RepositoryError>;

    async fn update(
        &self,
        aggregate: &mut Self::Aggregate,
    ) -> Result<Vec<Self::Event>, RepositoryError>;

    /// Roll `aggregate` back to `to_version`, removing later events per `mode`.
    async fn revert(
        &self,
        aggregate: Self::Aggregate,
        to_version: u64,
        mode: RevertMode,
    ) -> Result<Self::Aggregate, RepositoryError>;
}
