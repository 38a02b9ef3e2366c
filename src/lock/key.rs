use std::fmt;

use sha2::{Digest, Sha256};

/// The kind of identity a lock protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockNamespace {
    Aggregate,
    Index,
}

impl LockNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockNamespace::Aggregate => "aggregate",
            LockNamespace::Index => "index",
        }
    }
}

impl fmt::Display for LockNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the mutex guarding one identity.
///
/// The key is the hex SHA-256 digest of `"<namespace>:<identity>"`, so it is
/// stable for the same identity and never exposes the identity itself to the
/// lock backend (index keys can carry emails, usernames, etc).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockKey(String);

impl LockKey {
    pub fn derive(namespace: LockNamespace, identity: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(namespace.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(identity.as_bytes());
        LockKey(hex::encode(hasher.finalize()))
    }

    pub fn aggregate(id: impl AsRef<str>) -> Self {
        Self::derive(LockNamespace::Aggregate, id.as_ref())
    }

    pub fn index(value: impl AsRef<str>) -> Self {
        Self::derive(LockNamespace::Index, value.as_ref())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LockKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
