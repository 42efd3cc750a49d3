use crate::errors::Result;
use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref BACKEND_CALLS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "gateway_backend_calls_total",
            "Backend calls by operation and selected route"
        ),
        &["operation", "route"]
    )
    .expect("valid metric definition");
    pub static ref BACKEND_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "gateway_backend_errors_total",
            "Failed operations by operation and error kind"
        ),
        &["operation", "kind"]
    )
    .expect("valid metric definition");
    pub static ref BACKEND_LATENCY_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "gateway_backend_latency_seconds",
            "Time spent waiting on the routed backend"
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0
        ]),
        &["operation"]
    )
    .expect("valid metric definition");
    pub static ref ENRICHED_SENSORS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "gateway_enriched_sensors_total",
        "Temperature sensors updated with a live reading"
    ))
    .expect("valid metric definition");
    pub static ref ENRICHMENT_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "gateway_enrichment_failures_total",
        "Live temperature lookups that failed during enrichment"
    ))
    .expect("valid metric definition");
}

pub fn init_metrics() -> Result<()> {
    REGISTRY.register(Box::new(BACKEND_CALLS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(BACKEND_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(BACKEND_LATENCY_SECONDS.clone()))?;
    REGISTRY.register(Box::new(ENRICHED_SENSORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ENRICHMENT_FAILURES_TOTAL.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
