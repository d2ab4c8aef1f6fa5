//! Prometheus text exposition format.
//!
//! Renders the controller status into the Prometheus text exposition format
//! for scraping by a Prometheus server or compatible agent.

use std::fmt::Write;

use tidegate_core::ScalerStatus;

/// Render the controller status into Prometheus text format.
///
/// Produces GAUGE and COUNTER metrics with `namespace` and `deployment` labels.
/// Metric gauges are only emitted once a sample has been observed.
pub fn render_prometheus(status: &ScalerStatus) -> String {
    let labels = format!(
        "namespace=\"{}\",deployment=\"{}\"",
        escape(&status.namespace),
        escape(&status.deployment)
    );
    let mut out = String::new();

    let mut metric = |name: &str, kind: &str, help: &str, value: String| {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} {kind}");
        let _ = writeln!(out, "{name}{{{labels}}} {value}");
    };

    metric(
        "tidegate_replicas",
        "gauge",
        "Replica count the controller believes is live.",
        status.replicas.to_string(),
    );
    metric(
        "tidegate_replicas_min",
        "gauge",
        "Configured lower replica bound.",
        status.min_replicas.to_string(),
    );
    metric(
        "tidegate_replicas_max",
        "gauge",
        "Configured upper replica bound.",
        status.max_replicas.to_string(),
    );
    metric(
        "tidegate_cooldown_remaining_seconds",
        "gauge",
        "Seconds until another scale is permitted.",
        format!("{:.3}", status.cooldown_remaining_secs),
    );

    if let Some(m) = &status.last_metrics {
        metric(
            "tidegate_metric_cpu",
            "gauge",
            "Last sampled CPU per replica (millicores).",
            format!("{:.2}", m.cpu),
        );
        metric(
            "tidegate_metric_mem",
            "gauge",
            "Last sampled memory per replica (MiB).",
            format!("{:.2}", m.mem),
        );
        metric(
            "tidegate_metric_p95_ms",
            "gauge",
            "Last sampled P95 latency in milliseconds.",
            format!("{:.2}", m.p95),
        );
    }

    let c = &status.counters;
    metric(
        "tidegate_scale_total",
        "counter",
        "Successful scale actions.",
        c.scale_total.to_string(),
    );
    metric(
        "tidegate_hold_total",
        "counter",
        "Ticks that decided to hold.",
        c.hold_total.to_string(),
    );
    metric(
        "tidegate_actuation_failures_total",
        "counter",
        "Scale actions rejected by the orchestration API.",
        c.actuation_failures_total.to_string(),
    );
    metric(
        "tidegate_cooldown_skips_total",
        "counter",
        "Ticks skipped because the cooldown window was open.",
        c.cooldown_skips_total.to_string(),
    );
    metric(
        "tidegate_degraded_total",
        "counter",
        "Ticks held because metrics were unavailable.",
        c.degraded_total.to_string(),
    );

    out
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidegate_core::{MetricsSnapshot, ScalerCounters};

    fn test_status() -> ScalerStatus {
        ScalerStatus {
            namespace: "shop".to_string(),
            deployment: "web".to_string(),
            replicas: 4,
            min_replicas: 1,
            max_replicas: 10,
            thresholds: "CPU>500,Mem>512,P95>400".to_string(),
            cooldown_remaining_secs: 12.5,
            last_scale_at: None,
            last_metrics: None,
            decisions_recorded: 3,
            counters: ScalerCounters {
                scale_total: 2,
                hold_total: 1,
                actuation_failures_total: 1,
                cooldown_skips_total: 7,
                degraded_total: 0,
            },
        }
    }

    #[test]
    fn render_without_metrics() {
        let output = render_prometheus(&test_status());

        assert!(output.contains("# TYPE tidegate_replicas gauge"));
        assert!(output.contains("tidegate_replicas{namespace=\"shop\",deployment=\"web\"} 4"));
        assert!(output.contains("tidegate_cooldown_remaining_seconds{namespace=\"shop\",deployment=\"web\"} 12.500"));
        assert!(output.contains("tidegate_cooldown_skips_total{namespace=\"shop\",deployment=\"web\"} 7"));
        assert!(!output.contains("tidegate_metric_cpu"));
    }

    #[test]
    fn render_with_metrics() {
        let mut status = test_status();
        status.last_metrics = Some(MetricsSnapshot::now(612.0, 200.25, 98.0));
        let output = render_prometheus(&status);

        assert!(output.contains("tidegate_metric_cpu{namespace=\"shop\",deployment=\"web\"} 612.00"));
        assert!(output.contains("tidegate_metric_mem{namespace=\"shop\",deployment=\"web\"} 200.25"));
        assert!(output.contains("tidegate_metric_p95_ms{namespace=\"shop\",deployment=\"web\"} 98.00"));
    }

    #[test]
    fn label_values_are_escaped() {
        let mut status = test_status();
        status.deployment = "we\"b".to_string();
        let output = render_prometheus(&status);
        assert!(output.contains("deployment=\"we\\\"b\""));
    }

    #[test]
    fn render_format_is_prometheus_compatible() {
        let output = render_prometheus(&test_status());

        // Every non-empty, non-comment line should match: metric_name{labels} value
        for line in output.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            assert!(
                line.contains('{') && line.contains('}'),
                "line should have labels: {line}"
            );
        }
    }
}
