//! Autoscaler — the reconcile loop for one workload.
//!
//! Each tick checks the cooldown gate, samples the metrics source, runs the
//! hysteresis rule and, when the target differs, asks the actuator to apply
//! it. Every completed tick (hold or scale) lands in the audit log.
//!
//! The shared state lock is only held while reading the baseline and while
//! committing the result. Metrics sampling and actuation happen outside it,
//! so audit reads and predictions are never stuck behind a slow
//! orchestration call. A separate in-flight lock keeps ticks single-flight.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use tidegate_core::*;
use tidegate_metrics::MetricsSource;

use crate::actuator::{Actuator, ActuatorError};
use crate::audit::AuditLog;
use crate::cooldown::CooldownGate;
use crate::decision::decide;
use crate::predictor::{self, Prediction};

/// Default time between reconcile ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Reason recorded when a tick holds because sampling failed.
pub const REASON_METRICS_UNAVAILABLE: &str = "MetricsUnavailable";

/// What a single reconcile tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Cooldown window still open; nothing sampled, nothing recorded.
    CoolingDown { remaining: Duration },
    /// Rule said hold; a hold decision was recorded.
    Held { replicas: ReplicaCount },
    /// Metrics were unavailable; a degraded hold was recorded.
    Degraded { replicas: ReplicaCount },
    /// Actuation succeeded and was committed.
    Scaled { from: ReplicaCount, to: ReplicaCount },
    /// Actuation failed; state untouched, retried next tick.
    ActuationFailed { from: ReplicaCount, to: ReplicaCount },
    /// The baseline moved while actuating; nothing committed.
    Superseded { expected: ReplicaCount, found: ReplicaCount },
}

/// The critical region shared between the loop and the read surface.
struct ScalerState {
    replicas: ReplicaCount,
    cooldown: CooldownGate,
    last_scale_at: Option<DateTime<Utc>>,
    last_metrics: Option<MetricsSnapshot>,
    audit: AuditLog,
    counters: ScalerCounters,
}

/// Closed-loop controller for a single workload.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Autoscaler {
    config: Arc<ScalerConfig>,
    thresholds: Arc<str>,
    metrics: Arc<dyn MetricsSource>,
    actuator: Arc<dyn Actuator>,
    state: Arc<Mutex<ScalerState>>,
    in_flight: Arc<Mutex<()>>,
}

impl Autoscaler {
    /// Create a controller starting at `initial_replicas`.
    ///
    /// A starting count outside `[min_replicas, max_replicas]` is clamped
    /// into the band.
    pub fn new(
        config: ScalerConfig,
        initial_replicas: ReplicaCount,
        metrics: Arc<dyn MetricsSource>,
        actuator: Arc<dyn Actuator>,
    ) -> Self {
        let replicas = clamp_to_band(&config, initial_replicas);

        let state = ScalerState {
            replicas,
            cooldown: CooldownGate::new(config.cooldown),
            last_scale_at: None,
            last_metrics: None,
            audit: AuditLog::new(),
            counters: ScalerCounters::default(),
        };

        Self {
            thresholds: config.thresholds_summary().into(),
            config: Arc::new(config),
            metrics,
            actuator,
            state: Arc::new(Mutex::new(state)),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &ScalerConfig {
        &self.config
    }

    /// Adopt the live replica count reported by the actuator.
    ///
    /// Does not wait for an in-flight tick. A tick whose actuation overlaps
    /// a resync that moved the count ends as `Superseded`.
    pub async fn resync(&self) -> Result<ReplicaCount, ActuatorError> {
        let live = clamp_to_band(&self.config, self.actuator.current_replicas().await?);

        let mut state = self.state.lock().await;
        if state.replicas != live {
            info!(
                previous = state.replicas,
                live,
                "replica count resynced from orchestrator"
            );
            state.replicas = live;
        }
        Ok(live)
    }

    /// Run one sample → decide → actuate → record cycle.
    pub async fn reconcile(&self) -> TickOutcome {
        let _flight = self.in_flight.lock().await;

        let baseline = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            if !state.cooldown.allow(now) {
                let remaining = state.cooldown.remaining(now);
                state.counters.cooldown_skips_total += 1;
                debug!(
                    remaining_secs = remaining.as_secs_f64(),
                    "cooldown active, skipping tick"
                );
                return TickOutcome::CoolingDown { remaining };
            }
            state.replicas
        };

        let snapshot = match self.metrics.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    source = self.metrics.name(),
                    replicas = baseline,
                    error = %e,
                    "metrics unavailable, holding"
                );
                let mut decision = Decision::hold(
                    baseline,
                    REASON_METRICS_UNAVAILABLE,
                    self.thresholds.to_string(),
                );
                decision.degraded = true;

                let mut state = self.state.lock().await;
                state.counters.degraded_total += 1;
                state.audit.append(decision);
                return TickOutcome::Degraded { replicas: baseline };
            }
        };

        let decision = decide(baseline, &snapshot, &self.config);

        if !decision.changes(baseline) {
            debug!(
                replicas = baseline,
                cpu = snapshot.cpu,
                mem = snapshot.mem,
                p95 = snapshot.p95,
                "holding"
            );
            let mut state = self.state.lock().await;
            state.last_metrics = Some(snapshot);
            state.counters.hold_total += 1;
            state.audit.append(Decision::hold(
                baseline,
                decision.reason,
                self.thresholds.to_string(),
            ));
            return TickOutcome::Held { replicas: baseline };
        }

        self.state.lock().await.last_metrics = Some(snapshot);

        if let Err(e) = self.actuator.set_replicas(decision.target).await {
            warn!(
                from = baseline,
                to = decision.target,
                error = %e,
                "scaling action failed"
            );
            self.state.lock().await.counters.actuation_failures_total += 1;
            return TickOutcome::ActuationFailed {
                from: baseline,
                to: decision.target,
            };
        }

        let mut state = self.state.lock().await;
        if state.replicas != baseline {
            warn!(
                expected = baseline,
                found = state.replicas,
                "replica baseline moved during actuation, not committing"
            );
            return TickOutcome::Superseded {
                expected: baseline,
                found: state.replicas,
            };
        }

        state.replicas = decision.target;
        state.cooldown.record(Instant::now());
        state.last_scale_at = Some(Utc::now());
        state.counters.scale_total += 1;
        state.audit.append(Decision::scale(
            baseline,
            decision.target,
            decision.reason,
            self.thresholds.to_string(),
        ));

        info!(
            namespace = %self.config.namespace,
            deployment = %self.config.deployment,
            from = baseline,
            to = decision.target,
            reason = decision.reason,
            "scaled"
        );
        TickOutcome::Scaled {
            from: baseline,
            to: decision.target,
        }
    }

    /// Evaluate the rule against a synthetic load without touching state.
    pub async fn predict(&self, rps: f64) -> Prediction {
        let current = self.state.lock().await.replicas;
        predictor::predict(rps, current, &self.config)
    }

    /// Copy of the audit log, oldest first.
    pub async fn events(&self) -> Vec<Decision> {
        self.state.lock().await.audit.snapshot()
    }

    /// Replica count the controller believes is live.
    pub async fn replicas(&self) -> ReplicaCount {
        self.state.lock().await.replicas
    }

    pub async fn status(&self) -> ScalerStatus {
        let state = self.state.lock().await;
        ScalerStatus {
            namespace: self.config.namespace.clone(),
            deployment: self.config.deployment.clone(),
            replicas: state.replicas,
            min_replicas: self.config.min_replicas,
            max_replicas: self.config.max_replicas,
            thresholds: self.thresholds.to_string(),
            cooldown_remaining_secs: state.cooldown.remaining(Instant::now()).as_secs_f64(),
            last_scale_at: state.last_scale_at,
            last_metrics: state.last_metrics.clone(),
            decisions_recorded: state.audit.len(),
            counters: state.counters,
        }
    }

    /// Run the reconcile loop until shutdown is signalled.
    ///
    /// The first tick runs immediately. Shutdown is observed between ticks,
    /// so an in-flight actuation always completes.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = interval.as_secs_f64(),
            namespace = %self.config.namespace,
            deployment = %self.config.deployment,
            metrics = self.metrics.name(),
            "autoscaler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = self.reconcile().await;
            debug!(?outcome, "reconcile tick finished");

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("autoscaler shutting down");
    }
}

fn clamp_to_band(config: &ScalerConfig, replicas: ReplicaCount) -> ReplicaCount {
    let clamped = replicas.clamp(config.min_replicas, config.max_replicas);
    if clamped != replicas {
        warn!(
            live = replicas,
            clamped,
            min = config.min_replicas,
            max = config.max_replicas,
            "replica count outside configured band"
        );
    }
    clamped
}
