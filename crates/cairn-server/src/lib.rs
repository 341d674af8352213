//! # Cairn DNS Server
//!
//! Async authoritative DNS serving over UDP and TCP.
//!
//! ## Architecture
//!
//! - **Transports** ([`udp`], [`tcp`]): one task per datagram or connection,
//!   all sharing one `Arc<dyn QueryHandler>`
//! - **Handler** ([`authority`]): answers from a [`RecordSource`], with AA
//!   set and RA cleared
//! - **Zone transfer** ([`axfr`]): streams a zone snapshot to authorized
//!   secondaries
//! - **Notify** ([`notify`]): tells secondaries a zone changed
//!
//! [`RecordSource`]: cairn_zone::RecordSource

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

pub mod authority;
pub mod axfr;
pub mod handler;
pub mod notify;
pub mod tcp;
pub mod udp;

pub use authority::{AuthoritativeHandler, HandlerConfig};
pub use axfr::{AxfrOutcome, AxfrRefusal};
pub use handler::{BufferedResponder, MeteredHandler, QueryContext, QueryHandler, Respond};
pub use notify::{notify_zone, Notifier, NotifyError, NotifyReport};
pub use tcp::TcpServer;
pub use udp::UdpServer;

/// Server error types.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] cairn_proto::Error),

    #[error("Zone error: {0}")]
    Zone(#[from] cairn_zone::ZoneError),

    #[error("Shutdown in progress")]
    Shutdown,
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// DNS transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Plain UDP.
    Udp,
    /// Plain TCP.
    Tcp,
}

impl Protocol {
    /// Returns the default port for this protocol.
    pub const fn default_port(&self) -> u16 {
        cairn_proto::DNS_PORT
    }

    /// Returns the protocol name.
    pub const fn name(&self) -> &'static str {
        match self {
            Protocol::Udp => "UDP",
            Protocol::Tcp => "TCP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// UDP listen addresses.
    pub udp: Vec<SocketAddr>,

    /// TCP listen addresses.
    pub tcp: Vec<SocketAddr>,

    /// Idle timeout for TCP connections.
    pub tcp_idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let any: SocketAddr = ([0, 0, 0, 0], cairn_proto::DNS_PORT).into();
        Self {
            udp: vec![any],
            tcp: vec![any],
            tcp_idle_timeout: tcp::DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// DNS server instance.
pub struct DnsServer {
    config: ServerConfig,
    handler: Arc<dyn QueryHandler>,
    shutdown_tx: broadcast::Sender<()>,
}

impl DnsServer {
    /// Creates a new DNS server.
    pub fn new(config: ServerConfig, handler: Arc<dyn QueryHandler>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            handler,
            shutdown_tx,
        }
    }

    /// Binds all configured listeners and serves until [`shutdown`](Self::shutdown).
    pub async fn run(&self) -> Result<()> {
        let mut handles = Vec::new();

        for addr in &self.config.udp {
            let server = udp::UdpServer::bind(*addr, self.handler.clone()).await?;
            let mut shutdown_rx = self.shutdown_tx.subscribe();
            handles.push(tokio::spawn(async move {
                tokio::select! {
                    result = server.run() => result,
                    _ = shutdown_rx.recv() => Ok(()),
                }
            }));
        }

        for addr in &self.config.tcp {
            let mut server = tcp::TcpServer::bind(*addr, self.handler.clone()).await?;
            server.set_idle_timeout(self.config.tcp_idle_timeout);
            let mut shutdown_rx = self.shutdown_tx.subscribe();
            handles.push(tokio::spawn(async move {
                tokio::select! {
                    result = server.run() => result,
                    _ = shutdown_rx.recv() => Ok(()),
                }
            }));
        }

        if handles.is_empty() {
            return Err(ServerError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "no listeners configured",
            )));
        }

        for handle in handles {
            handle.await.map_err(|e| ServerError::Io(std::io::Error::other(e)))??;
        }

        info!("all listeners stopped");
        Ok(())
    }

    /// Initiates graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_names() {
        assert_eq!(Protocol::Udp.default_port(), 53);
        assert_eq!(Protocol::Tcp.to_string(), "TCP");
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.udp.len(), 1);
        assert_eq!(config.tcp_idle_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_run_without_listeners_fails() {
        let config = ServerConfig {
            udp: Vec::new(),
            tcp: Vec::new(),
            tcp_idle_timeout: Duration::from_secs(1),
        };
        let server = DnsServer::new(config, Arc::new(handler::RefusedHandler));
        assert!(matches!(server.run().await, Err(ServerError::Io(_))));
    }

    #[tokio::test]
    async fn test_shutdown_stops_listeners() {
        let config = ServerConfig {
            udp: vec!["127.0.0.1:0".parse().unwrap()],
            tcp: vec!["127.0.0.1:0".parse().unwrap()],
            tcp_idle_timeout: Duration::from_secs(1),
        };
        let server = Arc::new(DnsServer::new(config, Arc::new(handler::RefusedHandler)));
        let runner = {
            let server = server.clone();
            tokio::spawn(async move { server.run().await })
        };

        // Give run() time to bind and subscribe.
        tokio::time::sleep(Duration::from_millis(100)).await;
        server.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), runner)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
