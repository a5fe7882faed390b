use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// ── Availability ────────────────────────────────────────────────

/// Counter: availability evaluations. Labels: reason.
pub const AVAILABILITY_QUERIES_TOTAL: &str = "slotkeeper_availability_queries_total";

/// Histogram: day-walk duration in seconds.
pub const SCAN_DURATION_SECONDS: &str = "slotkeeper_scan_duration_seconds";

/// Counter: occupancy fetches that failed and fell back to a coarse answer.
pub const OCCUPANCY_FETCH_FAILURES_TOTAL: &str = "slotkeeper_occupancy_fetch_failures_total";

// ── Intake ──────────────────────────────────────────────────────

/// Counter: intake decisions. Labels: outcome (admitted, duplicate, rate_limited).
pub const INTAKE_OUTCOMES_TOTAL: &str = "slotkeeper_intake_outcomes_total";

/// Counter: duplicate lookups that failed and were skipped.
pub const DEDUP_LOOKUP_FAILURES_TOTAL: &str = "slotkeeper_dedup_lookup_failures_total";

// ── Tenancy ─────────────────────────────────────────────────────

/// Gauge: number of loaded businesses.
pub const BUSINESSES_ACTIVE: &str = "slotkeeper_businesses_active";

/// Install an in-process Prometheus recorder. Returns `None` (and logs) if a
/// recorder is already installed.
pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            tracing::info!("metrics recorder installed");
            Some(handle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to install metrics recorder");
            None
        }
    }
}
