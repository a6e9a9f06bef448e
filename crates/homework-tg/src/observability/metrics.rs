use super::GLOBAL_LABELS;
use crate::prelude::*;
use crate::{config, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use serde::Deserialize;

pub(crate) const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub(crate) const HOMEWORK_POLLS_TOTAL: &str = "homework_polls_total";
pub(crate) const HOMEWORK_NOTIFICATIONS_TOTAL: &str = "homework_notifications_total";

/// Histogram buckets to measure the distribution of request durations in seconds
const DEFAULT_DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

#[derive(Deserialize)]
struct MetricsConfig {
    /// The metrics listener is not started if the port isn't set
    metrics_port: Option<u16>,
}

pub fn init_metrics() -> Result {
    let vars: Vec<_> = std::env::vars().collect();
    let cfg: MetricsConfig = config::from_vars("", &vars)?;

    describe_metrics();

    let Some(port) = cfg.metrics_port else {
        debug!("METRICS_PORT is not set, metrics exporter is disabled");
        return Ok(());
    };

    let mut builder = PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .set_buckets_for_metric(
            Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_owned()),
            DEFAULT_DURATION_BUCKETS,
        )
        .fatal_ctx(|| "Invalid histogram buckets")?;

    for (key, value) in GLOBAL_LABELS {
        builder = builder.add_global_label(*key, *value);
    }

    builder
        .install()
        .fatal_ctx(|| format!("Failed to start the metrics listener on port {port}"))?;

    info!(port, "Metrics exporter is listening");

    Ok(())
}

fn describe_metrics() {
    metrics::describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Duration of a single HTTP request"
    );
    metrics::describe_counter!(
        HOMEWORK_POLLS_TOTAL,
        "Number of polling iterations grouped by their outcome and error kind"
    );
    metrics::describe_counter!(
        HOMEWORK_NOTIFICATIONS_TOTAL,
        "Number of messages the bot tried to send to the chat"
    );
}
