//! The hysteresis rule.
//!
//! Pure and deterministic: the same replica count, snapshot and config
//! always produce the same decision. Rules are checked in order and the
//! first match wins:
//!
//! ```text
//! any(metric > threshold)        && current < max  → current + 1
//! all(metric < threshold * 0.5)  && current > min  → current - 1
//! otherwise                                        → current
//! ```
//!
//! Comparisons are strict, so a metric sitting exactly on a threshold or
//! half-threshold holds. The up-check runs first, so a snapshot that
//! satisfies both conditions scales up.

use tidegate_core::{MetricsSnapshot, ReplicaCount, ScalerConfig};

pub const REASON_SCALE_UP: &str = "Any(metric)>threshold";
pub const REASON_SCALE_DOWN: &str = "All(metric)<half-threshold";
pub const REASON_HOLD: &str = "Hold";

/// Fraction of each threshold below which a metric counts as idle.
const DOWN_FACTOR: f64 = 0.5;

/// Output of the hysteresis rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleDecision {
    pub target: ReplicaCount,
    pub reason: &'static str,
}

impl ScaleDecision {
    /// `true` when the decision asks for a different replica count.
    pub fn changes(&self, current: ReplicaCount) -> bool {
        self.target != current
    }
}

/// Map (current replicas, metrics, config) to a target and a reason.
pub fn decide(
    current: ReplicaCount,
    metrics: &MetricsSnapshot,
    config: &ScalerConfig,
) -> ScaleDecision {
    let up = metrics.cpu > config.cpu_threshold
        || metrics.mem > config.mem_threshold
        || metrics.p95 > config.p95_threshold;

    let down = metrics.cpu < config.cpu_threshold * DOWN_FACTOR
        && metrics.mem < config.mem_threshold * DOWN_FACTOR
        && metrics.p95 < config.p95_threshold * DOWN_FACTOR;

    if up && current < config.max_replicas {
        return ScaleDecision {
            target: current + 1,
            reason: REASON_SCALE_UP,
        };
    }
    if down && current > config.min_replicas {
        return ScaleDecision {
            target: current - 1,
            reason: REASON_SCALE_DOWN,
        };
    }
    ScaleDecision {
        target: current,
        reason: REASON_HOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ScalerConfig {
        ScalerConfig {
            min_replicas: 1,
            max_replicas: 10,
            cpu_threshold: 500.0,
            mem_threshold: 512.0,
            p95_threshold: 400.0,
            ..ScalerConfig::default()
        }
    }

    fn snap(cpu: f64, mem: f64, p95: f64) -> MetricsSnapshot {
        MetricsSnapshot::now(cpu, mem, p95)
    }

    #[test]
    fn scale_up_when_any_metric_above_threshold() {
        let d = decide(3, &snap(600.0, 200.0, 100.0), &test_config());
        assert_eq!(d.target, 4);
        assert_eq!(d.reason, "Any(metric)>threshold");
    }

    #[test]
    fn scale_down_when_all_metrics_below_half() {
        let d = decide(3, &snap(100.0, 50.0, 50.0), &test_config());
        assert_eq!(d.target, 2);
        assert_eq!(d.reason, "All(metric)<half-threshold");
    }

    #[test]
    fn hold_at_min_on_down_condition() {
        let d = decide(1, &snap(100.0, 50.0, 50.0), &test_config());
        assert_eq!(d, ScaleDecision { target: 1, reason: "Hold" });
    }

    #[test]
    fn hold_at_max_on_up_condition() {
        let d = decide(10, &snap(600.0, 200.0, 100.0), &test_config());
        assert_eq!(d, ScaleDecision { target: 10, reason: "Hold" });
    }

    #[test]
    fn each_metric_alone_triggers_scale_up() {
        let config = test_config();
        assert_eq!(decide(2, &snap(0.0, 513.0, 0.0), &config).target, 3);
        assert_eq!(decide(2, &snap(0.0, 0.0, 401.0), &config).target, 3);
    }

    #[test]
    fn one_busy_metric_blocks_scale_down() {
        // CPU and memory are idle but latency sits between half and full threshold.
        let d = decide(5, &snap(10.0, 10.0, 300.0), &test_config());
        assert_eq!(d.target, 5);
        assert_eq!(d.reason, REASON_HOLD);
    }

    #[test]
    fn exactly_at_threshold_holds() {
        let d = decide(3, &snap(500.0, 512.0, 400.0), &test_config());
        assert_eq!(d.target, 3);
        assert_eq!(d.reason, REASON_HOLD);
    }

    #[test]
    fn exactly_at_half_threshold_holds() {
        let config = test_config();
        // Each metric on its own half-threshold boundary, the others idle.
        for m in [
            snap(250.0, 10.0, 10.0),
            snap(10.0, 256.0, 10.0),
            snap(10.0, 10.0, 200.0),
        ] {
            let d = decide(3, &m, &config);
            assert_eq!(d.target, 3, "boundary snapshot {m:?} should hold");
        }
    }

    #[test]
    fn up_wins_when_both_conditions_hold() {
        // Negative thresholds put the half-threshold above the threshold,
        // so one snapshot can satisfy both rules.
        let config = ScalerConfig {
            cpu_threshold: -10.0,
            mem_threshold: -10.0,
            p95_threshold: -10.0,
            ..test_config()
        };
        let d = decide(5, &snap(-7.0, -7.0, -7.0), &config);
        assert_eq!(d.target, 6);
        assert_eq!(d.reason, REASON_SCALE_UP);
    }

    #[test]
    fn decide_is_deterministic() {
        let config = test_config();
        let m = snap(480.0, 100.0, 350.0);
        let first = decide(4, &m, &config);
        for _ in 0..10 {
            assert_eq!(decide(4, &m, &config), first);
        }
    }

    #[test]
    fn target_never_leaves_band() {
        let config = ScalerConfig {
            min_replicas: 2,
            max_replicas: 6,
            ..test_config()
        };
        let loads = [0.0, 100.0, 199.9, 250.0, 400.0, 500.0, 512.0, 600.0, 10_000.0];

        for current in config.min_replicas..=config.max_replicas {
            for &cpu in &loads {
                for &mem in &loads {
                    for &p95 in &loads {
                        let d = decide(current, &snap(cpu, mem, p95), &config);
                        assert!(
                            config.in_band(d.target),
                            "current={current} cpu={cpu} mem={mem} p95={p95} → {}",
                            d.target
                        );
                        assert!((d.target - current).abs() <= 1);
                    }
                }
            }
        }
    }

    #[test]
    fn changes_reports_difference() {
        let d = ScaleDecision { target: 4, reason: REASON_SCALE_UP };
        assert!(d.changes(3));
        assert!(!d.changes(4));
    }
}
