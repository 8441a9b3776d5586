//! Prometheus exporter for the current heart rate.
//!
//! # Metrics Exposed
//!
//! - `heart_rate_bpm{target="<MetricTarget>"}` - Current heart rate, rounded
//!   to whole beats per minute
//!
//! The gauge is refreshed from the store on every scrape, so it can never
//! drift from what `/hr` reports.
//!
//! # Example
//!
//! ```
//! use heart_rate_relay::config::MetricTarget;
//! use heart_rate_relay::metrics::MetricsRegistry;
//! use heart_rate_relay::store::{Reading, Timestamp};
//!
//! let registry = MetricsRegistry::new(MetricTarget::new("alice")).expect("Failed to create registry");
//! let text = registry.render(&Reading::new(72.0, Timestamp::from(0))).unwrap();
//! assert!(text.ends_with("heart_rate_bpm{target=\"alice\"} 72\n"));
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, HEART_RATE_HELP, HEART_RATE_METRIC};
