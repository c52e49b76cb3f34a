use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub access_decisions_total: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn build() -> Metrics {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("metric can be created");

    let http_request_duration_seconds = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )
    .expect("metric can be created");

    let access_decisions_total = IntCounterVec::new(
        Opts::new(
            "access_gate_decisions_total",
            "Access gate decisions by outcome",
        ),
        &["outcome"],
    )
    .expect("metric can be created");

    registry
        .register(Box::new(http_requests_total.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(http_request_duration_seconds.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(access_decisions_total.clone()))
        .expect("collector can be registered");

    Metrics {
        registry,
        http_requests_total,
        http_request_duration_seconds,
        access_decisions_total,
    }
}

pub fn metrics() -> &'static Metrics {
    METRICS.get_or_init(build)
}

pub fn record_request(method: &str, path: &str, status: &str, seconds: f64) {
    let m = metrics();
    let labels = [method, path, status];
    m.http_requests_total.with_label_values(&labels).inc();
    m.http_request_duration_seconds
        .with_label_values(&labels)
        .observe(seconds);
}

pub fn record_decision(outcome: &str) {
    metrics()
        .access_decisions_total
        .with_label_values(&[outcome])
        .inc();
}

/// Render all metrics in the Prometheus text format.
pub fn gather() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics().registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
