use std::sync::OnceLock;
use std::time::Duration;

use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
    KeyValue,
};

use crate::build_status::BuildStatus;

pub struct Metrics {
    pub badges_served: Counter<u64>,
    pub upstream_failures: Counter<u64>,
    pub upstream_latency_seconds: Histogram<f64>,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

pub fn init() -> Result<(), anyhow::Error> {
    let meter = global::meter("badger");

    let metrics = Metrics {
        badges_served: meter
            .u64_counter("badger_badges_served_total")
            .with_description("Badges served, by route and resolved status")
            .init(),
        upstream_failures: meter
            .u64_counter("badger_upstream_failures_total")
            .with_description("Failed Cloud Build list calls")
            .init(),
        upstream_latency_seconds: meter
            .f64_histogram("badger_upstream_latency_seconds")
            .with_description("Cloud Build list call latency")
            .init(),
    };

    METRICS
        .set(metrics)
        .map_err(|_| anyhow::anyhow!("Metrics already initialized"))?;

    Ok(())
}

// Recording is a no-op until init() has run, which keeps handlers usable in tests.

pub fn record_badge(route: &'static str, status: &BuildStatus) {
    if let Some(m) = METRICS.get() {
        m.badges_served.add(
            1,
            &[
                KeyValue::new("route", route),
                KeyValue::new("status", status.as_str().to_string()),
            ],
        );
    }
}

pub fn record_upstream_failure() {
    if let Some(m) = METRICS.get() {
        m.upstream_failures.add(1, &[]);
    }
}

pub fn record_upstream_latency(elapsed: Duration) {
    if let Some(m) = METRICS.get() {
        m.upstream_latency_seconds.record(elapsed.as_secs_f64(), &[]);
    }
}
