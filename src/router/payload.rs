//! Tolerant parsing of heart-rate POST bodies.
//!
//! Clients disagree on field names, so both the heart-rate value and the
//! timestamp are looked up through a fixed list of aliases. The first alias
//! present wins; JSON key order never matters.

use crate::store::Timestamp;
use serde_json::{Map, Value};
use thiserror::Error;

/// Heart-rate field aliases, highest priority first.
pub const HEART_RATE_KEYS: [&str; 5] = ["heartRate", "heart_rate", "heartrate", "hr", "bpm"];

/// Timestamp field aliases, highest priority first.
pub const TIMESTAMP_KEYS: [&str; 3] = ["timestamp", "time", "ts"];

/// Largest accepted heart-rate magnitude, in beats per minute.
pub const MAX_HEART_RATE: f64 = 1000.0;

/// Reasons a POST body is rejected.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The body is not JSON.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The body is JSON but not an object.
    #[error("payload must be a JSON object")]
    NotAnObject,

    /// None of [`HEART_RATE_KEYS`] is present.
    #[error("no heart rate key found in payload")]
    MissingHeartRate,

    /// None of [`TIMESTAMP_KEYS`] is present.
    #[error("no timestamp key found in payload")]
    MissingTimestamp,

    /// The heart rate is not a finite number within range.
    #[error("heart rate value is not a number within range")]
    InvalidHeartRate,

    /// The timestamp is neither a number nor a string.
    #[error("timestamp must be a number or a string")]
    InvalidTimestamp,
}

/// A validated heart-rate update.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartRateUpdate {
    /// Beats per minute.
    pub value: f64,
    /// Client-supplied timestamp, untouched.
    pub timestamp: Timestamp,
}

/// Parses a raw request body into an update.
pub fn parse(body: &[u8]) -> Result<HeartRateUpdate, PayloadError> {
    let json: Value = serde_json::from_slice(body)?;
    let Value::Object(fields) = json else {
        return Err(PayloadError::NotAnObject);
    };

    let raw_value = first_present(&fields, &HEART_RATE_KEYS).ok_or(PayloadError::MissingHeartRate)?;
    let raw_timestamp =
        first_present(&fields, &TIMESTAMP_KEYS).ok_or(PayloadError::MissingTimestamp)?;

    let value = heart_rate_value(raw_value)?;
    let timestamp = Timestamp::from_json(raw_timestamp).ok_or(PayloadError::InvalidTimestamp)?;

    Ok(HeartRateUpdate { value, timestamp })
}

fn first_present<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| fields.get(*key))
}

fn heart_rate_value(raw: &Value) -> Result<f64, PayloadError> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        // Some watch apps send numbers as strings.
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite() && v.abs() <= MAX_HEART_RATE)
        .ok_or(PayloadError::InvalidHeartRate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn parse_json(value: Value) -> Result<HeartRateUpdate, PayloadError> {
        parse(value.to_string().as_bytes())
    }

    #[test]
    fn test_short_aliases() {
        let update = parse(br#"{"hr": 81.7, "ts": 1000}"#).unwrap();
        assert_eq!(update.value, 81.7);
        assert_eq!(update.timestamp, Timestamp::from(1000));
    }

    #[test]
    fn test_watch_payload() {
        let update = parse(br#"{"heart_rate": 64.0, "timestamp": 1717171717000}"#).unwrap();
        assert_eq!(update.value, 64.0);
        assert_eq!(update.timestamp.to_string(), "1717171717000");
    }

    #[test]
    fn test_alias_priority_is_fixed() {
        // bpm appears first in the document but has the lowest priority.
        let update = parse(br#"{"bpm": 50, "heart_rate": 60, "heartRate": 70, "time": "t1", "timestamp": "t0"}"#)
            .unwrap();
        assert_eq!(update.value, 70.0);
        assert_eq!(update.timestamp, Timestamp::from("t0"));
    }

    #[test]
    fn test_numeric_string_accepted() {
        let update = parse_json(json!({"bpm": " 72.5 ", "time": "noon"})).unwrap();
        assert_eq!(update.value, 72.5);
    }

    #[test]
    fn test_missing_heart_rate() {
        let err = parse_json(json!({"pulse": 70, "ts": 1})).unwrap_err();
        assert!(matches!(err, PayloadError::MissingHeartRate));
    }

    #[test]
    fn test_missing_timestamp() {
        let err = parse_json(json!({"hr": 70, "date": 1})).unwrap_err();
        assert!(matches!(err, PayloadError::MissingTimestamp));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            parse_json(json!({"hr": "fast", "ts": 1})),
            Err(PayloadError::InvalidHeartRate)
        ));
        assert!(matches!(
            parse_json(json!({"hr": null, "ts": 1})),
            Err(PayloadError::InvalidHeartRate)
        ));
        assert!(matches!(
            parse_json(json!({"hr": "inf", "ts": 1})),
            Err(PayloadError::InvalidHeartRate)
        ));
        assert!(matches!(
            parse_json(json!({"hr": 70, "ts": true})),
            Err(PayloadError::InvalidTimestamp)
        ));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for raw in [json!(1e300), json!(-1e300), json!(1000.5), json!("1e19")] {
            assert!(
                matches!(
                    parse_json(json!({"hr": raw, "ts": 1})),
                    Err(PayloadError::InvalidHeartRate)
                ),
                "{raw}"
            );
        }
        let update = parse_json(json!({"hr": MAX_HEART_RATE, "ts": 1})).unwrap();
        assert_eq!(update.value, MAX_HEART_RATE);
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(matches!(parse(b""), Err(PayloadError::InvalidJson(_))));
        assert!(matches!(parse(b"{\"hr\": 7"), Err(PayloadError::InvalidJson(_))));
        assert!(matches!(parse(b"[70, 1]"), Err(PayloadError::NotAnObject)));
        assert!(matches!(parse(b"70"), Err(PayloadError::NotAnObject)));
    }

    proptest! {
        #[test]
        fn any_alias_pair_parses(
            hr_key in prop::sample::select(HEART_RATE_KEYS.to_vec()),
            ts_key in prop::sample::select(TIMESTAMP_KEYS.to_vec()),
            value in 0.0f64..300.0,
            ts in any::<u32>(),
        ) {
            let mut fields = Map::new();
            fields.insert(hr_key.to_string(), json!(value));
            fields.insert(ts_key.to_string(), json!(ts));

            let update = parse_json(Value::Object(fields)).unwrap();
            prop_assert!((update.value - value).abs() < 1e-9);
            prop_assert_eq!(update.timestamp, Timestamp::from(ts as i64));
        }

        #[test]
        fn higher_priority_alias_wins(
            first in 0usize..HEART_RATE_KEYS.len(),
            second in 0usize..HEART_RATE_KEYS.len(),
        ) {
            prop_assume!(first != second);
            let mut fields = Map::new();
            fields.insert(HEART_RATE_KEYS[first].to_string(), json!(first as f64));
            fields.insert(HEART_RATE_KEYS[second].to_string(), json!(second as f64));
            fields.insert("ts".to_string(), json!(0));

            let update = parse_json(Value::Object(fields)).unwrap();
            prop_assert_eq!(update.value, first.min(second) as f64);
        }
    }
}
