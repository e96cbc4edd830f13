use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const RECORDS_LOADED: &str = "records_loaded_total";
pub const RECORDS_SKIPPED: &str = "records_skipped_total";
pub const LOAD_FAILURES: &str = "load_failures_total";
pub const IMPORT_FAILURES: &str = "import_failures_total";
pub const ENRICHMENT_REQUESTS: &str = "enrichment_requests_total";
pub const ENRICHMENT_STALE: &str = "enrichment_stale_total";
pub const ENRICHMENT_FAILURES: &str = "enrichment_failures_total";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(RECORDS_LOADED, "Records accepted from loads and imports.");
        describe_counter!(
            RECORDS_SKIPPED,
            "Records skipped for a malformed coordinate or timestamp."
        );
        describe_counter!(LOAD_FAILURES, "Default data source load failures.");
        describe_counter!(IMPORT_FAILURES, "Rejected manual imports.");
        describe_counter!(ENRICHMENT_REQUESTS, "Reverse geocoding lookups started.");
        describe_counter!(
            ENRICHMENT_STALE,
            "Reverse geocoding results discarded because the selection changed."
        );
        describe_counter!(ENRICHMENT_FAILURES, "Reverse geocoding lookups that failed.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Call once per process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        ensure_described();
        gauge!("geotrace_build_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
