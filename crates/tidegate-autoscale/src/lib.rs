//! tidegate-autoscale — closed-loop replica control for one workload.
//!
//! Samples a `MetricsSource`, applies a hysteresis rule, gates changes
//! behind a cooldown window, and applies them through an `Actuator`.
//! Every decision lands in a bounded audit log. A what-if predictor runs
//! the same rule against a synthetic load without touching state.
//!
//! # Scaling Algorithm
//!
//! ```text
//! if cooldown window open:  skip tick
//!
//! if any(metric > threshold) and replicas < max:
//!     ScaleTo(replicas + 1)
//!
//! if all(metric < threshold * 0.5) and replicas > min:
//!     ScaleTo(replicas - 1)
//!
//! otherwise: Hold
//! ```
//!
//! The gap between the up-threshold and the half-threshold is the
//! hysteresis band; together with the single cooldown timer it keeps the
//! replica count from oscillating.

pub mod actuator;
pub mod audit;
pub mod cooldown;
pub mod decision;
pub mod predictor;
pub mod scaler;

pub use actuator::{Actuator, ActuatorError, DryRunActuator};
pub use audit::{AuditLog, AUDIT_CAPACITY};
pub use cooldown::CooldownGate;
pub use decision::{decide, ScaleDecision};
pub use predictor::{predict, synthesize_metrics, Prediction};
pub use scaler::{Autoscaler, TickOutcome, DEFAULT_INTERVAL};
