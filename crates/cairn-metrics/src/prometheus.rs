//! Prometheus metrics exporter.

use std::net::SocketAddr;

#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::PrometheusBuilder;

/// Prometheus scrape endpoint configuration.
#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    /// Listen address.
    pub listen: SocketAddr,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: ([127, 0, 0, 1], 9153).into(),
        }
    }
}

/// Exporter installation failure.
#[derive(Debug, thiserror::Error)]
#[error("failed to install Prometheus exporter: {0}")]
pub struct ExporterError(String);

/// Installs the Prometheus exporter as the global `metrics` recorder.
#[cfg(feature = "prometheus")]
pub fn init_prometheus(config: &PrometheusConfig) -> Result<(), ExporterError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen)
        .install()
        .map_err(|e| ExporterError(e.to_string()))?;

    tracing::info!(addr = %config.listen, "Prometheus exporter listening");
    Ok(())
}

/// Without the `prometheus` feature the facade stays a no-op recorder.
#[cfg(not(feature = "prometheus"))]
pub fn init_prometheus(config: &PrometheusConfig) -> Result<(), ExporterError> {
    tracing::debug!(addr = %config.listen, "built without Prometheus support");
    Ok(())
}
