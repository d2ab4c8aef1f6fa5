//! Domain types shared by the tidegate controller.
//!
//! Metrics snapshots, audit decisions and the status view are all
//! serializable to JSON because they are served verbatim over HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Replica count as understood by the orchestration API.
pub type ReplicaCount = i32;

// ── Metrics ───────────────────────────────────────────────────────

/// Point-in-time load signal for the managed workload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    /// Average CPU per replica (millicores).
    pub cpu: f64,
    /// Average memory per replica (MiB).
    pub mem: f64,
    /// P95 request latency in milliseconds.
    pub p95: f64,
    /// When the sample was taken.
    #[serde(rename = "at")]
    pub taken_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Build a snapshot stamped with the current wall-clock time.
    pub fn now(cpu: f64, mem: f64, p95: f64) -> Self {
        Self {
            cpu,
            mem,
            p95,
            taken_at: Utc::now(),
        }
    }
}

// ── Decisions ─────────────────────────────────────────────────────

/// What a reconcile tick did with the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Scale,
    Hold,
}

/// One audit-log entry. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub time: DateTime<Utc>,
    pub action: Action,
    pub from: ReplicaCount,
    pub to: ReplicaCount,
    pub reason: String,
    /// Thresholds in force when the decision was made, e.g. `CPU>500,Mem>512,P95>400`.
    #[serde(rename = "threshold")]
    pub thresholds: String,
    /// Set when the metrics backend was unavailable and the hold was forced.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl Decision {
    /// A hold at `replicas`.
    pub fn hold(replicas: ReplicaCount, reason: impl Into<String>, thresholds: String) -> Self {
        Self {
            time: Utc::now(),
            action: Action::Hold,
            from: replicas,
            to: replicas,
            reason: reason.into(),
            thresholds,
            degraded: false,
        }
    }

    /// A completed scale from `from` to `to`.
    pub fn scale(
        from: ReplicaCount,
        to: ReplicaCount,
        reason: impl Into<String>,
        thresholds: String,
    ) -> Self {
        Self {
            time: Utc::now(),
            action: Action::Scale,
            from,
            to,
            reason: reason.into(),
            thresholds,
            degraded: false,
        }
    }
}

// ── Status ────────────────────────────────────────────────────────

/// Running totals kept by the controller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScalerCounters {
    pub scale_total: u64,
    pub hold_total: u64,
    pub actuation_failures_total: u64,
    pub cooldown_skips_total: u64,
    pub degraded_total: u64,
}

/// Read-only view of the controller, served on `/status` and `/metrics`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalerStatus {
    pub namespace: String,
    pub deployment: String,
    pub replicas: ReplicaCount,
    pub min_replicas: ReplicaCount,
    pub max_replicas: ReplicaCount,
    pub thresholds: String,
    /// Seconds until the cooldown window closes (0 when open).
    pub cooldown_remaining_secs: f64,
    pub last_scale_at: Option<DateTime<Utc>>,
    pub last_metrics: Option<MetricsSnapshot>,
    pub decisions_recorded: usize,
    pub counters: ScalerCounters,
}
