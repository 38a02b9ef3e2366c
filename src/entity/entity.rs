use serde::Serialize;

use super::{EventRecord, PayloadError};

/// Identity and event stream of one aggregate instance.
///
/// The stream is split in two: `committed` events are the ones a repository
/// has stored, `pending` ones were recorded since and are handed over on the
/// next write. The version counts both.
#[derive(Clone, Debug, Default)]
pub struct Entity {
    id: String,
    committed: Vec<EventRecord>,
    pending: Vec<EventRecord>,
    replaying: bool,
}

impl Entity {
    pub fn new() -> Self {
        Entity::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Entity {
            id: id.into(),
            ..Entity::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn version(&self) -> u64 {
        (self.committed.len() + self.pending.len()) as u64
    }

    /// Version as of the last repository write or load.
    pub fn committed_version(&self) -> u64 {
        self.committed.len() as u64
    }

    /// Every event, committed first.
    pub fn history(&self) -> impl Iterator<Item = &EventRecord> + '_ {
        self.committed.iter().chain(self.pending.iter())
    }

    pub fn pending(&self) -> &[EventRecord] {
        &self.pending
    }

    /// Move pending events to the committed part of the stream.
    pub fn commit(&mut self) {
        self.committed.append(&mut self.pending);
    }

    /// Replace the whole stream with `history`, all of it committed.
    pub fn restore(&mut self, history: Vec<EventRecord>) {
        self.committed = history;
        self.pending.clear();
    }

    /// Record a pending event carrying `payload`. Ignored while replaying.
    pub fn record<T: Serialize>(
        &mut self,
        name: impl Into<String>,
        payload: &T,
    ) -> Result<(), PayloadError> {
        if self.replaying {
            return Ok(());
        }

        let record = EventRecord::encode(name, self.version() + 1, payload)?;
        self.pending.push(record);
        Ok(())
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub(crate) fn set_replaying(&mut self, replaying: bool) {
        self.replaying = replaying;
    }
}
