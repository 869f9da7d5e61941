use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("dataset_uploads_total", "Successful CSV uploads.");
        describe_counter!("dataset_parse_errors_total", "Rejected CSV uploads.");
        describe_counter!("filter_runs_total", "Filtered view recomputations.");
        describe_counter!(
            "insight_requests_total",
            "Outbound insight requests by outcome."
        );
        describe_counter!(
            "insight_stale_discarded_total",
            "Insight responses dropped because the selection changed."
        );
        describe_gauge!("dataset_rows", "Rows in the current dataset.");

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
