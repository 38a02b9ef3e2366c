use std::collections::BTreeMap;
use std::time::SystemTime;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Metadata key carrying the id of the aggregate that raised an event.
pub const AGGREGATE_ID_META: &str = "aggregate_id";

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("payload error: {message}")]
pub struct PayloadError {
    pub message: String,
}

impl PayloadError {
    fn from_bitcode(err: bitcode::Error) -> Self {
        PayloadError {
            message: err.to_string(),
        }
    }
}

/// Bitcode-encoded event body. Serializes as a base64 string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, PayloadError> {
        bitcode::serialize(value)
            .map(Payload)
            .map_err(PayloadError::from_bitcode)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
        bitcode::deserialize(&self.0).map_err(PayloadError::from_bitcode)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload(bytes)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map(Payload)
            .map_err(serde::de::Error::custom)
    }
}

/// One event in an aggregate's stream.
///
/// `sequence` is the aggregate version the event produced, starting at 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    name: String,
    sequence: u64,
    payload: Payload,
    recorded_at: SystemTime,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
}

impl EventRecord {
    pub fn new(name: impl Into<String>, sequence: u64, payload: impl Into<Payload>) -> Self {
        EventRecord {
            name: name.into(),
            sequence,
            payload: payload.into(),
            recorded_at: SystemTime::now(),
            metadata: BTreeMap::new(),
        }
    }

    /// Build a record whose payload is `value`, bitcode encoded.
    pub fn encode<T: Serialize>(
        name: impl Into<String>,
        sequence: u64,
        value: &T,
    ) -> Result<Self, PayloadError> {
        Ok(Self::new(name, sequence, Payload::encode(value)?))
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn recorded_at(&self) -> SystemTime {
        self.recorded_at
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
        self.payload.decode()
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Id of the aggregate that raised this event, once a repository has stamped it.
    pub fn aggregate_id(&self) -> Option<&str> {
        self.meta(AGGREGATE_ID_META)
    }
}
