/*!
Observability infrastructure for confhist.

This module provides:
- Structured logging and tracing setup
- Prometheus metrics for history writes and lookups
*/

#[cfg(feature = "metrics")]
use prometheus::{Counter, Encoder, Histogram, Registry, TextEncoder};
#[cfg(feature = "metrics")]
use std::sync::OnceLock;
use tracing::subscriber::set_global_default;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry as TracingRegistry};

use crate::{HistoryError, Result};

/// Global metrics instance
#[cfg(feature = "metrics")]
static METRICS: OnceLock<HistoryMetrics> = OnceLock::new();

/// Metrics collection for history store operations
#[cfg(feature = "metrics")]
#[derive(Debug)]
pub struct HistoryMetrics {
    pub records_total: Counter,
    pub record_errors_total: Counter,
    pub locates_total: Counter,
    pub skipped_entries_total: Counter,
    pub snapshot_size_bytes: Histogram,

    // Prometheus registry for scraping
    registry: Registry,
}

#[cfg(feature = "metrics")]
impl HistoryMetrics {
    fn new() -> Result<Self> {
        let registry = Registry::new();

        let records_total = Counter::new(
            "confhist_records_total",
            "Total history entries recorded",
        )
        .map_err(|e| metric_error("records_total", e))?;

        let record_errors_total = Counter::new(
            "confhist_record_errors_total",
            "Total failed attempts to record a history entry",
        )
        .map_err(|e| metric_error("record_errors_total", e))?;

        let locates_total = Counter::new(
            "confhist_locates_total",
            "Total history lookups by composite identifier",
        )
        .map_err(|e| metric_error("locates_total", e))?;

        let skipped_entries_total = Counter::new(
            "confhist_skipped_entries_total",
            "Matching history entries skipped because they could not be decoded",
        )
        .map_err(|e| metric_error("skipped_entries_total", e))?;

        let snapshot_size_bytes = Histogram::with_opts(prometheus::HistogramOpts::new(
            "confhist_snapshot_size_bytes",
            "Size of serialized snapshots in bytes",
        ))
        .map_err(|e| metric_error("snapshot_size_bytes", e))?;

        registry
            .register(Box::new(records_total.clone()))
            .map_err(|e| metric_error("records_total", e))?;
        registry
            .register(Box::new(record_errors_total.clone()))
            .map_err(|e| metric_error("record_errors_total", e))?;
        registry
            .register(Box::new(locates_total.clone()))
            .map_err(|e| metric_error("locates_total", e))?;
        registry
            .register(Box::new(skipped_entries_total.clone()))
            .map_err(|e| metric_error("skipped_entries_total", e))?;
        registry
            .register(Box::new(snapshot_size_bytes.clone()))
            .map_err(|e| metric_error("snapshot_size_bytes", e))?;

        Ok(Self {
            records_total,
            record_errors_total,
            locates_total,
            skipped_entries_total,
            snapshot_size_bytes,
            registry,
        })
    }

    /// Get or initialize global metrics instance
    pub fn global() -> &'static HistoryMetrics {
        METRICS.get_or_init(|| Self::new().expect("Failed to initialize confhist metrics"))
    }

    pub fn record_write(&self) {
        self.records_total.inc();
    }

    pub fn record_write_error(&self) {
        self.record_errors_total.inc();
    }

    pub fn record_locate(&self) {
        self.locates_total.inc();
    }

    pub fn record_skipped(&self, count: usize) {
        if count > 0 {
            self.skipped_entries_total.inc_by(count as f64);
        }
    }

    pub fn record_snapshot_size(&self, size_bytes: usize) {
        self.snapshot_size_bytes.observe(size_bytes as f64);
    }

    /// Gather metrics in Prometheus text format
    pub fn gather_metrics(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| HistoryError::storage(format!("Failed to encode metrics: {e}")))?;

        String::from_utf8(buffer)
            .map_err(|e| HistoryError::storage(format!("Failed to convert metrics to string: {e}")))
    }
}

#[cfg(feature = "metrics")]
fn metric_error(name: &str, e: prometheus::Error) -> HistoryError {
    HistoryError::storage(format!("Failed to set up {name} metric: {e}"))
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence; otherwise `confhist` logs at `info`, or
/// `debug` when `verbose` is set.
///
/// # Arguments
/// * `verbose` - Lower the default level to `debug`
/// * `json` - Emit structured JSON lines instead of human-readable text
pub fn init_observability(verbose: bool, json: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("confhist={default_level}")));

    let result = if json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(false)
            .with_writer(std::io::stderr);
        set_global_default(TracingRegistry::default().with(filter).with(fmt_layer))
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);
        set_global_default(TracingRegistry::default().with(filter).with(fmt_layer))
    };

    result.map_err(|e| {
        HistoryError::validation(format!("Failed to set global tracing subscriber: {e}"))
    })?;

    tracing::debug!("confhist observability initialized");
    Ok(())
}

/// Initialize observability with default settings
pub fn init_default_observability() -> Result<()> {
    init_observability(false, false)
}


#[cfg(test)]
mod init_tests {
    use super::*;

    #[test]
    fn test_second_initialization_fails() {
        let _ = init_default_observability();
        assert!(init_default_observability().is_err());
    }
}
