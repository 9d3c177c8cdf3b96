use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Upstream token metrics
    pub token_exchanges: IntCounterVec,
    pub token_cache_hits: IntCounter,

    // Workbook metrics
    pub upstream_requests: IntCounterVec,
    pub upstream_duration: HistogramVec,

    // Inbound metrics
    pub auth_rejections: IntCounterVec,
    pub odata_requests: IntCounterVec,

    // Config/runtime
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("workbookodata".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Upstream token
            token_exchanges: IntCounterVec::new(Opts::new("token_exchanges_total", "Client-credentials exchanges by outcome"),&["outcome"],).unwrap(),
            token_cache_hits: IntCounter::new("token_cache_hits_total", "Requests served with a cached upstream token").unwrap(),

            // Workbook
            upstream_requests: IntCounterVec::new(Opts::new("upstream_requests_total", "Workbook API requests by operation and outcome"),&["operation", "outcome"],).unwrap(),
            upstream_duration: HistogramVec::new(HistogramOpts::new("upstream_request_duration_seconds", "Workbook API request duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),&["operation"],).unwrap(),

            // Inbound
            auth_rejections: IntCounterVec::new(Opts::new("auth_rejections_total", "Rejected inbound requests by reason"),&["reason"],).unwrap(),
            odata_requests: IntCounterVec::new(Opts::new("odata_requests_total", "Authorized OData requests by operation"),&["operation"],).unwrap(),

            // Config/runtime
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_exchanges.clone())).unwrap();
        reg.register(Box::new(metrics.token_cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_requests.clone())).unwrap();
        reg.register(Box::new(metrics.upstream_duration.clone())).unwrap();
        reg.register(Box::new(metrics.auth_rejections.clone())).unwrap();
        reg.register(Box::new(metrics.odata_requests.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
