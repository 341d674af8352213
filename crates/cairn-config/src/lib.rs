//! # Cairn DNS Configuration
//!
//! YAML-first configuration for the cairn authoritative server. JSON and
//! TOML files are accepted too, chosen by file extension.
//!
//! Every section has defaults, so an empty file is a valid configuration
//! that listens on port 53 and serves no zones.

use arc_swap::ArcSwap;
use cairn_proto::Name;
use cairn_zone::{admin_mailbox, SoaDefaults, ZoneSettings};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod listeners;
pub mod zones;

pub use listeners::ListenerConfig;
pub use zones::{RecordConfig, ZoneConfig};

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("File not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main configuration for the cairn server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server identification.
    pub server: ServerConfig,

    /// UDP and TCP listeners.
    pub listeners: ListenerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Settings for newly created zones.
    pub store: StoreConfig,

    /// Request handler behavior.
    pub handler: HandlerConfig,

    /// NOTIFY behavior.
    pub notify: NotifyConfig,

    /// Zones to serve.
    pub zones: Vec<ZoneConfig>,
}

impl Config {
    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?, // Default to YAML
        };

        Ok(config)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.listeners.validate()?;
        self.logging.validate()?;
        self.store.validate()?;
        self.handler.validate()?;

        for zone in &self.zones {
            zone.validate()?;
        }

        Ok(())
    }

    /// Serializes to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server name, used in logs.
    pub name: String,

    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "cairn".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log format (text, json).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                message: format!("unknown level {:?}", self.level),
            });
        }
        if !matches!(self.format.to_ascii_lowercase().as_str(), "text" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format".to_string(),
                message: format!("unknown format {:?}", self.format),
            });
        }
        Ok(())
    }
}

/// Zone store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Primary name server written into every apex SOA and NS.
    pub ns_domain: String,

    /// Responsible person, as an email address.
    pub ns_admin_email: String,

    /// SOA timers and default TTL.
    pub soa: SoaDefaults,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ns_domain: "ns.localhost".to_string(),
            ns_admin_email: "hostmaster@localhost".to_string(),
            soa: SoaDefaults::default(),
        }
    }
}

impl StoreConfig {
    /// Builds the settings used to create zones.
    pub fn zone_settings(&self) -> Result<ZoneSettings> {
        let ns_domain = Name::from_str(&self.ns_domain).map_err(|e| ConfigError::InvalidValue {
            field: "store.ns_domain".to_string(),
            message: e.to_string(),
        })?;
        if ns_domain.is_root() {
            return Err(ConfigError::InvalidValue {
                field: "store.ns_domain".to_string(),
                message: "must not be the root".to_string(),
            });
        }

        let ns_admin = admin_mailbox(&self.ns_admin_email).map_err(|e| ConfigError::InvalidValue {
            field: "store.ns_admin_email".to_string(),
            message: e.to_string(),
        })?;

        Ok(ZoneSettings {
            ns_domain,
            ns_admin,
            soa: self.soa,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.zone_settings().map(|_| ())
    }
}

/// Reply policy for refused zone transfers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferRefusal {
    /// Answer REFUSED.
    #[default]
    Refuse,
    /// Send nothing.
    Drop,
}

/// Request handler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// UDP payload size advertised in OPT records.
    pub edns_udp_size: u16,

    /// Log lookup failures.
    pub log_errors: bool,

    /// What unauthorized AXFR clients get.
    pub axfr_refusal: TransferRefusal,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            edns_udp_size: cairn_proto::DEFAULT_EDNS_UDP_SIZE,
            log_errors: true,
            axfr_refusal: TransferRefusal::Refuse,
        }
    }
}

impl HandlerConfig {
    pub fn validate(&self) -> Result<()> {
        if usize::from(self.edns_udp_size) < cairn_proto::MAX_UDP_MESSAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "handler.edns_udp_size".to_string(),
                message: format!("{} is below 512", self.edns_udp_size),
            });
        }
        Ok(())
    }
}

/// NOTIFY configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Per-secondary timeout in milliseconds.
    pub timeout_ms: u64,

    /// Notify every zone's secondaries once the zones are loaded.
    pub on_startup: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            on_startup: true,
        }
    }
}

impl NotifyConfig {
    /// Returns the per-secondary timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Thread-safe configuration holder with reload support.
pub struct ConfigHolder {
    config: ArcSwap<Config>,
    path: RwLock<Option<PathBuf>>,
}

impl ConfigHolder {
    /// Creates a new configuration holder.
    pub fn new(config: Config) -> Self {
        Self {
            config: ArcSwap::new(Arc::new(config)),
            path: RwLock::new(None),
        }
    }

    /// Creates a holder from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Config::from_file(path)?;
        Ok(Self {
            config: ArcSwap::new(Arc::new(config)),
            path: RwLock::new(Some(path.to_path_buf())),
        })
    }

    /// Returns the current configuration.
    pub fn get(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Reloads configuration from the file.
    ///
    /// An invalid file leaves the current configuration in place.
    pub fn reload(&self) -> Result<()> {
        let path = self.path.read();
        if let Some(p) = path.as_ref() {
            let config = Config::from_file(p)?;
            config.validate()?;
            self.config.store(Arc::new(config));
        }
        Ok(())
    }

    /// Updates the configuration.
    pub fn update(&self, config: Config) {
        self.config.store(Arc::new(config));
    }
}

impl Default for ConfigHolder {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
