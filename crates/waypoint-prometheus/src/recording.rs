// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder can collect these metrics.
//! Crates that own an event record it themselves behind their `prometheus`
//! feature; the helpers here cover the pipeline-level series.

use metrics::{describe_counter, describe_histogram};

/// Register all Waypoint metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "waypoint_requests_total",
        "Requests answered, by the cascade tier that produced the answer"
    );
    describe_counter!(
        "waypoint_breaker_transitions_total",
        "Circuit breaker state transitions"
    );
    describe_histogram!(
        "waypoint_provider_latency_seconds",
        "Model provider call latency in seconds"
    );
    describe_counter!(
        "waypoint_cache_lookups_total",
        "Cache lookups by namespace and result"
    );
}

/// Record an answered request.
pub fn record_request(source: &str) {
    metrics::counter!("waypoint_requests_total", "source" => source.to_string()).increment(1);
}

/// Record a breaker entering `state`.
pub fn record_breaker_transition(name: &str, state: &str) {
    metrics::counter!(
        "waypoint_breaker_transitions_total",
        "name" => name.to_string(),
        "state" => state.to_string()
    )
    .increment(1);
}

/// Record one provider call's latency.
pub fn record_provider_latency(provider: &str, seconds: f64) {
    metrics::histogram!("waypoint_provider_latency_seconds", "provider" => provider.to_string())
        .record(seconds);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn request_counter_is_labelled_by_source() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            register_metrics();
            record_request("template");
            record_request("template");
            record_request("model");
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"waypoint_requests_total{source="template"} 2"#));
        assert!(rendered.contains(r#"waypoint_requests_total{source="model"} 1"#));
    }

    #[test]
    fn breaker_transitions_carry_name_and_state() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_breaker_transition("strategy_engine", "open");
        });

        let rendered = handle.render();
        assert!(rendered.contains("waypoint_breaker_transitions_total"));
        assert!(rendered.contains(r#"name="strategy_engine""#));
        assert!(rendered.contains(r#"state="open""#));
    }

    #[test]
    fn provider_latency_is_recorded() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_provider_latency("hub", 0.25);
        });

        assert!(handle.render().contains(r#"waypoint_provider_latency_seconds_count{provider="hub"} 1"#));
    }
}
