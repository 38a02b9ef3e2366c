use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one aggregate instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(String);

impl AggregateId {
    pub fn new(id: impl Into<String>) -> Self {
        AggregateId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AggregateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AggregateId {
    fn from(id: &str) -> Self {
        AggregateId(id.to_string())
    }
}

impl From<String> for AggregateId {
    fn from(id: String) -> Self {
        AggregateId(id)
    }
}

impl From<&String> for AggregateId {
    fn from(id: &String) -> Self {
        AggregateId(id.clone())
    }
}
