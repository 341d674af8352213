//! Listener configuration.

use super::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Network listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// UDP listen addresses.
    pub udp: Vec<SocketAddr>,

    /// TCP listen addresses.
    pub tcp: Vec<SocketAddr>,

    /// Seconds a TCP connection may sit idle before it is closed.
    pub tcp_idle_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        let any = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 53);
        Self {
            udp: vec![any],
            tcp: vec![any],
            tcp_idle_timeout_secs: 10,
        }
    }
}

impl ListenerConfig {
    /// Returns the TCP idle timeout.
    pub fn tcp_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.tcp_idle_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.udp.is_empty() && self.tcp.is_empty() {
            return Err(ConfigError::Validation(
                "at least one UDP or TCP listener is required".to_string(),
            ));
        }

        if !self.tcp.is_empty() && self.tcp_idle_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "listeners.tcp_idle_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ListenerConfig::default();
        assert_eq!(config.udp[0].port(), 53);
        assert_eq!(config.tcp_idle_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_requires_a_listener() {
        let config = ListenerConfig {
            udp: Vec::new(),
            tcp: Vec::new(),
            tcp_idle_timeout_secs: 10,
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_idle_timeout() {
        let config = ListenerConfig {
            tcp_idle_timeout_secs: 0,
            ..ListenerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
