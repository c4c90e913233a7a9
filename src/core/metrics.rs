use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

// Exam endpoints are short reads plus the occasional large import.
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Installs the Prometheus recorder when enabled. Without it every
/// `metrics::counter!` call is a no-op.
pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install_recorder()?;
    let _ = PROM_HANDLE.set(handle);

    describe_counter!("exam_transitions_total", "Exam lifecycle transitions by action and outcome");
    describe_counter!("exam_imports_total", "Snapshot imports by outcome");
    describe_counter!("exam_import_rows_total", "Rows written by snapshot imports, by table");
    describe_counter!("http_requests_total", "HTTP requests by status");
    describe_histogram!("http_request_duration_seconds", Unit::Seconds, "HTTP request latency");
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(PrometheusHandle::render)
}
