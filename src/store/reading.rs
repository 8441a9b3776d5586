//! The current heart-rate reading and its client-supplied timestamp.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Opaque timestamp token supplied by the client.
///
/// The relay never interprets this as wall-clock time; it is carried
/// through to the sinks exactly as it arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// A JSON number, kept in its original integer or float representation.
    Number(Number),
    /// A JSON string.
    Text(String),
}

impl Timestamp {
    /// Converts a JSON value into a timestamp.
    ///
    /// Returns `None` for anything that is not a number or a string.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::Number(Number::from(0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// A heart-rate value paired with the timestamp it was reported with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reading {
    /// Beats per minute.
    pub value: f64,
    /// Client-supplied timestamp token.
    pub timestamp: Timestamp,
}

impl Reading {
    /// Creates a new reading.
    pub fn new(value: f64, timestamp: Timestamp) -> Self {
        Self { value, timestamp }
    }

    /// Returns the value rounded to whole beats per minute.
    ///
    /// Halfway cases round to even, matching `{:.0}` formatting.
    /// Non-finite values map to zero and magnitudes beyond `i64` saturate.
    /// The HTTP layer rejects anything above
    /// [`MAX_HEART_RATE`](crate::router::payload::MAX_HEART_RATE), so
    /// saturation only shows up for values set directly on the store.
    pub fn bpm(&self) -> i64 {
        if !self.value.is_finite() {
            return 0;
        }
        self.value.round_ties_even() as i64
    }
}
