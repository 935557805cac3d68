//! Prometheus metrics.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default exporter port.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
    /// Address to bind the metrics exporter.
    pub listen_addr: SocketAddr,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings.
    #[must_use]
    pub fn from_settings(settings: &MetricsSettings) -> Self {
        let port = settings.port.unwrap_or(DEFAULT_METRICS_PORT);
        Self {
            enabled: settings.enabled.unwrap_or(false),
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        }
    }
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// Returns `false` without doing anything when metrics are disabled; the
/// `metrics` macros are then no-ops.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or a recorder is already
/// installed.
pub fn install_prometheus(config: &MetricsConfig) -> Result<bool> {
    if !config.enabled {
        return Ok(false);
    }

    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| Error::OperationFailed {
            operation: "metrics_exporter_install".to_string(),
            cause: e.to_string(),
        })?;

    tracing::info!(addr = %config.listen_addr, "Prometheus exporter listening");
    Ok(true)
}
