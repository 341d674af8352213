//! # Cairn DNS Metrics
//!
//! Observability for the authoritative server: structured logging through
//! `tracing`, and counters and histograms through the `metrics` facade.
//!
//! ## Features
//!
//! - **Structured logging**: text and JSON formats with `RUST_LOG` overrides
//! - **Query metrics**: queries, responses by rcode, latency per transport
//! - **Secondary metrics**: zone transfer and NOTIFY outcomes
//! - **Prometheus**: optional exporter behind the `prometheus` feature

use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub mod prometheus;
pub mod tracing_setup;

pub use tracing_setup::{init_tracing, init_tracing_from_env, LogConfig, LogFormat};

/// Global metrics instance.
static METRICS: OnceCell<DnsMetrics> = OnceCell::new();

/// Gets or initializes the global metrics instance.
pub fn metrics() -> &'static DnsMetrics {
    METRICS.get_or_init(DnsMetrics::new)
}

/// DNS server metrics.
///
/// Every event is forwarded to the `metrics` facade. The running totals are
/// also kept locally so they can be read without an exporter installed.
pub struct DnsMetrics {
    start_time: Instant,
    queries_total: AtomicU64,
    responses_total: AtomicU64,
    transfers_total: AtomicU64,
    notifies_total: AtomicU64,
}

impl DnsMetrics {
    /// Creates a new metrics instance.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            queries_total: AtomicU64::new(0),
            responses_total: AtomicU64::new(0),
            transfers_total: AtomicU64::new(0),
            notifies_total: AtomicU64::new(0),
        }
    }

    /// Returns the server uptime.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    // =========================================================================
    // Query metrics
    // =========================================================================

    /// Records a received query.
    pub fn record_query(&self, protocol: &str, qtype: &str) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        counter!("dns_queries_total", "protocol" => protocol.to_string(), "type" => qtype.to_string()).increment(1);
    }

    /// Records a sent response.
    pub fn record_response(&self, protocol: &str, rcode: &str) {
        self.responses_total.fetch_add(1, Ordering::Relaxed);
        counter!("dns_responses_total", "protocol" => protocol.to_string(), "rcode" => rcode.to_string()).increment(1);
    }

    /// Records query latency.
    pub fn record_latency(&self, protocol: &str, duration: Duration) {
        histogram!("dns_query_duration_seconds", "protocol" => protocol.to_string()).record(duration.as_secs_f64());
    }

    // =========================================================================
    // Secondary metrics
    // =========================================================================

    /// Records the outcome of an AXFR request.
    pub fn record_transfer(&self, zone: &str, outcome: &str) {
        self.transfers_total.fetch_add(1, Ordering::Relaxed);
        counter!("dns_zone_transfers_total", "zone" => zone.to_string(), "outcome" => outcome.to_string())
            .increment(1);
    }

    /// Records the outcome of one NOTIFY exchange.
    pub fn record_notify(&self, outcome: &str) {
        self.notifies_total.fetch_add(1, Ordering::Relaxed);
        counter!("dns_notify_total", "outcome" => outcome.to_string()).increment(1);
    }

    // =========================================================================
    // Totals
    // =========================================================================

    /// Queries recorded so far.
    pub fn queries_total(&self) -> u64 {
        self.queries_total.load(Ordering::Relaxed)
    }

    /// Responses recorded so far.
    pub fn responses_total(&self) -> u64 {
        self.responses_total.load(Ordering::Relaxed)
    }

    /// Transfers recorded so far, whatever their outcome.
    pub fn transfers_total(&self) -> u64 {
        self.transfers_total.load(Ordering::Relaxed)
    }

    /// NOTIFY exchanges recorded so far.
    pub fn notifies_total(&self) -> u64 {
        self.notifies_total.load(Ordering::Relaxed)
    }
}

impl Default for DnsMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Query timing helper.
pub struct QueryTimer {
    start: Instant,
    protocol: &'static str,
}

impl QueryTimer {
    /// Starts a new query timer.
    pub fn start(protocol: &'static str) -> Self {
        Self {
            start: Instant::now(),
            protocol,
        }
    }

    /// Returns the elapsed duration.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Finishes timing and records the latency.
    pub fn finish(self) {
        metrics().record_latency(self.protocol, self.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = DnsMetrics::new();
        assert!(metrics.uptime() >= Duration::ZERO);
        assert_eq!(metrics.queries_total(), 0);
    }

    #[test]
    fn test_totals_count_without_recorder() {
        let metrics = DnsMetrics::new();
        metrics.record_query("UDP", "A");
        metrics.record_query("TCP", "AXFR");
        metrics.record_response("UDP", "NOERROR");
        metrics.record_transfer("domain.tld", "refused");
        metrics.record_notify("timeout");
        metrics.record_notify("ok");

        assert_eq!(metrics.queries_total(), 2);
        assert_eq!(metrics.responses_total(), 1);
        assert_eq!(metrics.transfers_total(), 1);
        assert_eq!(metrics.notifies_total(), 2);
    }

    #[test]
    fn test_query_timer() {
        let timer = QueryTimer::start("UDP");
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
        timer.finish();
    }
}
