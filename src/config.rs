//! Relay configuration.
//!
//! Settings come from an optional TOML file. Every section has defaults,
//! so an empty file (or no file at all) gives a working relay on port 9025
//! that forwards to a local OSC receiver and does not write CSV logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 9025;

/// Label used when neither configuration nor environment names a target.
pub const DEFAULT_METRIC_TARGET: &str = "default_user";

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for [`FileConfig`].
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    /// The file parsed but a value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Label value for the metrics endpoint.
    #[serde(default)]
    pub metric_target: Option<String>,
    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,
    /// OSC realtime sink.
    #[serde(default)]
    pub osc: OscConfig,
    /// CSV durable log.
    #[serde(default)]
    pub csv: CsvConfig,
    /// Plotting window flag.
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind: IpAddr,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Creates a config listening on all interfaces at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Returns the socket address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// OSC realtime sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    /// Send each update over OSC.
    pub enabled: bool,
    /// Receiver host name or IP.
    pub host: String,
    /// Receiver UDP port.
    pub port: u16,
    /// OSC address pattern the value is sent to.
    pub address: String,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".into(),
            port: 9000,
            address: "/avatar/parameters/HeartRate".into(),
        }
    }
}

impl OscConfig {
    /// Default settings with the sink turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// CSV durable log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    /// Append each update to a CSV file.
    pub enabled: bool,
    /// Directory receiving the per-run CSV file.
    pub directory: PathBuf,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from("."),
        }
    }
}

/// Live visualization toggle.
///
/// The plotting window belongs to a separate tool; the relay only carries
/// the flag so one config file can drive both.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Whether the plotting window should be shown.
    pub enabled: bool,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.osc.enabled {
            if self.osc.port == 0 {
                return Err(ConfigError::Invalid("osc.port must be non-zero".into()));
            }
            if !self.osc.address.starts_with('/') {
                return Err(ConfigError::Invalid(
                    "osc.address must start with '/'".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Label value identifying whose heart rate `/metrics` reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricTarget(String);

impl MetricTarget {
    /// Creates a target from an explicit label value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Resolves the target from the process environment.
    ///
    /// Precedence: `explicit`, `METRIC_TARGET`, `configured`, `USER`,
    /// then [`DEFAULT_METRIC_TARGET`].
    pub fn resolve(explicit: Option<&str>, configured: Option<&str>) -> Self {
        Self::resolve_with(explicit, configured, |key| std::env::var(key).ok())
    }

    /// Same as [`MetricTarget::resolve`] with a custom variable lookup.
    pub fn resolve_with<F>(explicit: Option<&str>, configured: Option<&str>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = explicit
            .map(str::to_owned)
            .or_else(|| lookup("METRIC_TARGET"))
            .or_else(|| configured.map(str::to_owned))
            .or_else(|| lookup("USER"))
            .unwrap_or_else(|| DEFAULT_METRIC_TARGET.to_owned());
        Self(value)
    }

    /// Returns the label value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
