// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The global recorder can be installed once per process.

use serial_test::serial;
use waypoint_core::{AdapterType, HealthStatus, PluginAdapter};
use waypoint_prometheus::{record_request, PrometheusAdapter};

#[tokio::test]
#[serial]
async fn installs_once_and_renders_recorded_series() {
    let adapter = PrometheusAdapter::new().expect("first install succeeds");
    assert_eq!(adapter.name(), "prometheus");
    assert_eq!(adapter.adapter_type(), AdapterType::Observability);
    assert_eq!(adapter.health_check().await.unwrap(), HealthStatus::Healthy);

    record_request("tool");
    let rendered = adapter.render();
    assert!(rendered.contains(r#"waypoint_requests_total{source="tool"} 1"#));

    assert!(PrometheusAdapter::new().is_err());
}
