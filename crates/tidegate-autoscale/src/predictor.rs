//! What-if predictions.
//!
//! Turns a single load figure into a synthetic snapshot and runs it through
//! the same hysteresis rule as the live loop. Nothing here touches
//! controller state. Any load value is evaluated as given; a negative rate
//! simply yields negative CPU and memory figures.
//!
//! ```text
//! cpu = 2 × rps
//! mem = 1 × rps
//! p95 = 100 + 0.8 × max(0, rps − 200)
//! ```

use serde::Serialize;

use tidegate_core::{MetricsSnapshot, ReplicaCount, ScalerConfig};

use crate::decision::decide;

const CPU_PER_RPS: f64 = 2.0;
const MEM_PER_RPS: f64 = 1.0;
const P95_BASE_MS: f64 = 100.0;
const P95_KNEE_RPS: f64 = 200.0;
const P95_SLOPE: f64 = 0.8;

/// Result of a what-if evaluation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Prediction {
    pub from: ReplicaCount,
    pub to: ReplicaCount,
    pub reason: String,
    pub metrics: MetricsSnapshot,
}

/// Synthesize a snapshot from a request rate.
pub fn synthesize_metrics(rps: f64) -> MetricsSnapshot {
    let cpu = CPU_PER_RPS * rps;
    let mem = MEM_PER_RPS * rps;
    let p95 = P95_BASE_MS + P95_SLOPE * (rps - P95_KNEE_RPS).max(0.0);
    MetricsSnapshot::now(cpu, mem, p95)
}

/// Evaluate the rule against a synthetic load at `current` replicas.
pub fn predict(rps: f64, current: ReplicaCount, config: &ScalerConfig) -> Prediction {
    let metrics = synthesize_metrics(rps);
    let decision = decide(current, &metrics, config);

    Prediction {
        from: current,
        to: decision.target,
        reason: decision.reason.to_string(),
        metrics,
    }
}
