use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the process-wide `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token cache metrics
    pub token_lookups: IntCounterVec,
    pub token_issuance_failures: IntCounter,
    pub token_issuance_duration: HistogramVec,
    pub token_expiry_unix: IntGauge,

    // Durable store metrics
    pub store_failures: IntCounterVec,

    // Management API metrics
    pub management_requests: IntCounterVec,
    pub management_duration: HistogramVec,

    // HTTP surface
    pub http_requests: IntCounterVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("idpadmin".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Token cache
            token_lookups: IntCounterVec::new(Opts::new("token_lookups_total", "Token lookups by serving tier"), &["tier"]).unwrap(),
            token_issuance_failures: IntCounter::new("token_issuance_failures_total", "Failed client-credentials token requests").unwrap(),
            token_issuance_duration: HistogramVec::new(HistogramOpts::new("token_issuance_duration_seconds", "Token issuance duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["outcome"]).unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry of the token held in memory").unwrap(),

            // Store
            store_failures: IntCounterVec::new(Opts::new("store_failures_total", "Durable store failures by operation"), &["store", "operation"]).unwrap(),

            // Management
            management_requests: IntCounterVec::new(Opts::new("management_requests_total", "Management API calls by operation and outcome"), &["operation", "outcome"]).unwrap(),
            management_duration: HistogramVec::new(HistogramOpts::new("management_request_duration_seconds", "Management API call duration").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["operation"]).unwrap(),

            // HTTP
            http_requests: IntCounterVec::new(Opts::new("http_requests_total", "Admin API requests by route and status"), &["route", "status"]).unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_lookups.clone())).unwrap();
        reg.register(Box::new(metrics.token_issuance_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_issuance_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.store_failures.clone())).unwrap();
        reg.register(Box::new(metrics.management_requests.clone())).unwrap();
        reg.register(Box::new(metrics.management_duration.clone())).unwrap();
        reg.register(Box::new(metrics.http_requests.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
