//! Observers notified whenever the current reading changes.
//!
//! Two kinds of sink exist:
//! - a [`RealtimeSink`] that forwards each value immediately (OSC over UDP)
//! - a [`DurableLogSink`] that appends each reading to a log (CSV file)
//!
//! Which implementations are active is decided once at startup by
//! [`Sinks::from_config`]. Disabled sinks are [`NoopSink`], so the rest of
//! the system never has to check whether a feature is turned on.
//!
//! Sink failures are never fatal. The [`SinkDispatcher`] logs them and
//! moves on to the next notification.

mod csv;
mod dispatch;
mod osc;

pub use self::csv::CsvSink;
pub use dispatch::{SinkDispatcher, SinkEvent, QUEUE_CAPACITY};
pub use osc::{encode_message, OscSink};

use crate::config::{CsvConfig, OscConfig};
use crate::store::Timestamp;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by sink implementations.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Socket or file I/O failed.
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The value could not be encoded for the sink.
    #[error("failed to encode sink message: {0}")]
    Encode(String),
}

/// Receives every new value as soon as it is committed.
#[async_trait]
pub trait RealtimeSink: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Forwards a value. `timestamp` is `None` for the shutdown reset.
    async fn send(&self, value: f64, timestamp: Option<&Timestamp>) -> Result<(), SinkError>;
}

/// Append-only record of every committed reading.
#[async_trait]
pub trait DurableLogSink: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Appends one reading.
    async fn write(&self, timestamp: &Timestamp, value: f64) -> Result<(), SinkError>;
}

/// Sink that accepts everything and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

#[async_trait]
impl RealtimeSink for NoopSink {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn send(&self, _value: f64, _timestamp: Option<&Timestamp>) -> Result<(), SinkError> {
        Ok(())
    }
}

#[async_trait]
impl DurableLogSink for NoopSink {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn write(&self, _timestamp: &Timestamp, _value: f64) -> Result<(), SinkError> {
        Ok(())
    }
}

/// The set of sinks notified on each update.
#[derive(Clone)]
pub struct Sinks {
    /// Realtime forwarding sink.
    pub realtime: Arc<dyn RealtimeSink>,
    /// Durable log sink.
    pub log: Arc<dyn DurableLogSink>,
}

impl Sinks {
    /// Creates a sink set from explicit implementations.
    pub fn new(realtime: Arc<dyn RealtimeSink>, log: Arc<dyn DurableLogSink>) -> Self {
        Self { realtime, log }
    }

    /// Creates a sink set where every sink is a no-op.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopSink), Arc::new(NoopSink))
    }

    /// Builds the sink set described by the configuration.
    ///
    /// A sink that is enabled but cannot be set up is replaced by a no-op
    /// with a warning, the same as if it had been disabled.
    pub async fn from_config(osc: &OscConfig, csv: &CsvConfig) -> Self {
        let realtime: Arc<dyn RealtimeSink> = if osc.enabled {
            match OscSink::connect(&osc.host, osc.port, &osc.address).await {
                Ok(sink) => Arc::new(sink),
                Err(e) => {
                    tracing::warn!(error = %e, "OSC sink unavailable; heart rate will not be sent over OSC");
                    Arc::new(NoopSink)
                }
            }
        } else {
            Arc::new(NoopSink)
        };

        let log: Arc<dyn DurableLogSink> = if csv.enabled {
            match CsvSink::create(&csv.directory, chrono::Local::now()).await {
                Ok(sink) => Arc::new(sink),
                Err(e) => {
                    tracing::warn!(error = %e, "CSV sink unavailable; heart rate will not be logged");
                    Arc::new(NoopSink)
                }
            }
        } else {
            Arc::new(NoopSink)
        };

        tracing::info!(realtime = realtime.name(), log = log.name(), "Sinks configured");

        Self { realtime, log }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_config_yields_noop_sinks() {
        let sinks = Sinks::from_config(&OscConfig::disabled(), &CsvConfig::default()).await;
        assert_eq!(sinks.realtime.name(), "noop");
        assert_eq!(sinks.log.name(), "noop");
    }

    #[tokio::test]
    async fn test_noop_sink_never_fails() {
        let sink = NoopSink;
        assert!(RealtimeSink::send(&sink, 70.0, None).await.is_ok());
        assert!(DurableLogSink::write(&sink, &Timestamp::default(), 70.0)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_enabled_csv_config_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let csv = CsvConfig {
            enabled: true,
            directory: dir.path().to_path_buf(),
        };

        let sinks = Sinks::from_config(&OscConfig::disabled(), &csv).await;
        assert_eq!(sinks.log.name(), "csv");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
