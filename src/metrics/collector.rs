//! Metrics collection and registry.

use crate::config::MetricTarget;
use crate::store::Reading;
use parking_lot::Mutex;
use prometheus::{Encoder, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Name of the exported gauge.
pub const HEART_RATE_METRIC: &str = "heart_rate_bpm";

/// Help text of the exported gauge.
pub const HEART_RATE_HELP: &str = "Current heart rate";

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or text encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics registry for heart-rate monitoring.
pub struct MetricsRegistry {
    registry: Registry,
    heart_rate: IntGauge,
    // Serializes update + encode so concurrent scrapes each render the
    // reading they were given.
    scrape: Mutex<()>,
}

impl MetricsRegistry {
    /// Creates a registry exporting `heart_rate_bpm{target="..."}`.
    ///
    /// The target is emitted verbatim apart from the escaping the text
    /// format requires: `\`, `"` and newlines.
    pub fn new(target: MetricTarget) -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let heart_rate = IntGauge::with_opts(
            Opts::new(HEART_RATE_METRIC, HEART_RATE_HELP).const_label("target", target.as_str()),
        )?;
        registry.register(Box::new(heart_rate.clone()))?;

        Ok(Self {
            registry,
            heart_rate,
            scrape: Mutex::new(()),
        })
    }

    /// Updates the gauge from a reading.
    pub fn update(&self, reading: &Reading) {
        self.heart_rate.set(reading.bpm());
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Updates the gauge from `reading` and encodes the result atomically.
    pub fn render(&self, reading: &Reading) -> Result<String, MetricsError> {
        let _guard = self.scrape.lock();
        self.update(reading);
        self.encode()
    }
}
