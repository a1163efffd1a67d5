use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

pub const RENEWAL_RENEWED: &str = "renewed";
pub const RENEWAL_SKIPPED: &str = "skipped";
pub const RENEWAL_FAILED: &str = "failed";

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Upstream metrics
    pub upstream_fetch_requests: IntCounterVec,
    pub upstream_fetch_failures: IntCounterVec,
    pub upstream_fetch_duration: HistogramVec,
    pub malformed_rows: IntCounterVec,

    // Cache metrics
    pub cache_hits: IntCounterVec,
    pub cache_misses: IntCounterVec,
    pub cached_entries: IntGaugeVec,

    // Credential metrics
    pub credential_renewals: IntCounterVec,
    pub credential_expiry_unix: IntGauge,

    // Gateway metrics
    pub request_failures: IntCounterVec,

    // Config/runtime
    pub config_parse_failures: IntCounter,
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("sheetsagent".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Upstream
            upstream_fetch_requests: IntCounterVec::new(Opts::new("upstream_fetch_requests_total", "Row fetches by namespace"), &["namespace"]).unwrap(),
            upstream_fetch_failures: IntCounterVec::new(Opts::new("upstream_fetch_failures_total", "Row fetch failures by reason"), &["namespace", "reason"]).unwrap(),
            upstream_fetch_duration: HistogramVec::new(HistogramOpts::new("upstream_fetch_duration_seconds", "Row fetch duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["namespace"]).unwrap(),
            malformed_rows: IntCounterVec::new(Opts::new("malformed_rows_total", "Rows skipped because the key cell was unusable"), &["namespace"]).unwrap(),

            // Cache
            cache_hits: IntCounterVec::new(Opts::new("cache_hits_total", "Requests served from a fresh namespace record"), &["namespace"]).unwrap(),
            cache_misses: IntCounterVec::new(Opts::new("cache_misses_total", "Requests that refreshed the namespace record"), &["namespace"]).unwrap(),
            cached_entries: IntGaugeVec::new(Opts::new("cached_entries", "Entries held per namespace"), &["namespace"]).unwrap(),

            // Credential
            credential_renewals: IntCounterVec::new(Opts::new("credential_renewals_total", "Refresher ticks by outcome"), &["outcome"]).unwrap(),
            credential_expiry_unix: IntGauge::new("credential_expiry_unix_seconds", "Access token expiry timestamp").unwrap(),

            // Gateway
            request_failures: IntCounterVec::new(Opts::new("request_failures_total", "Failed gateway requests by reason"), &["route", "reason"]).unwrap(),

            // Config/runtime
            config_parse_failures: IntCounter::new("config_parse_failures_total", "Config files that could not be parsed").unwrap(),
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.upstream_fetch_requests.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.malformed_rows.clone())).unwrap();
        reg.register(Box::new(metrics.cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.cache_misses.clone())).unwrap();
        reg.register(Box::new(metrics.cached_entries.clone())).unwrap();
        reg.register(Box::new(metrics.credential_renewals.clone())).unwrap();
        reg.register(Box::new(metrics.credential_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.request_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_parse_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
