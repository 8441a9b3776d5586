//! Heart Rate Relay Library
//!
//! Receives heart-rate readings pushed by a watch over HTTP, keeps the
//! latest one in memory and re-exposes it to display overlays, OSC
//! receivers and Prometheus.
//!
//! # Architecture
//!
//! ```text
//! POST /hr → router → payload → store ──→ sink dispatcher → OSC, CSV
//!                                 │
//! GET /hr, /metrics ← router ←────┘
//! ```
//!
//! # Design Principles
//!
//! - **One reading**: the store holds the current value only, no history
//! - **Tolerant input**: field names are matched against alias lists
//! - **Validate before mutate**: rejected payloads never touch the store
//! - **Sinks are best-effort**: a failing sink is logged and never reaches
//!   the HTTP client
//!
//! # Example
//!
//! ```no_run
//! use heart_rate_relay::{
//!     config::{MetricTarget, ServerConfig},
//!     server::RelayServer,
//!     sink::Sinks,
//! };
//!
//! # async fn run() -> Result<(), heart_rate_relay::server::ServerError> {
//! let server = RelayServer::bind(
//!     &ServerConfig::with_port(9025),
//!     MetricTarget::resolve(None, None),
//!     Sinks::disabled(),
//! )
//! .await?;
//!
//! // Serves until Ctrl+C, then sends a final zero to the realtime sink.
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod router;
pub mod server;
pub mod sink;
pub mod store;

// Re-export commonly used types at crate root
pub use config::{FileConfig, MetricTarget};
pub use metrics::MetricsRegistry;
pub use router::{build_router, AppState};
pub use server::RelayServer;
pub use sink::{DurableLogSink, NoopSink, RealtimeSink, Sinks};
pub use store::{Reading, ReadingStore, Timestamp};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
