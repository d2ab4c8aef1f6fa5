//! The actuation capability.
//!
//! An `Actuator` is bound to one workload at construction time and applies
//! replica counts to it through the orchestration API.

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use tidegate_core::ReplicaCount;

/// Errors reported by an actuator.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("workload not found: {0}")]
    NotFound(String),

    #[error("update of {workload} kept conflicting after {attempts} attempts")]
    Conflict { workload: String, attempts: u32 },

    #[error("orchestration API error: {0}")]
    Api(String),
}

#[async_trait]
pub trait Actuator: Send + Sync {
    /// Read the live replica count.
    async fn current_replicas(&self) -> Result<ReplicaCount, ActuatorError>;

    /// Apply `target` as the desired replica count.
    async fn set_replicas(&self, target: ReplicaCount) -> Result<(), ActuatorError>;
}

/// Accepts every change without touching a cluster.
pub struct DryRunActuator {
    replicas: AtomicI32,
}

impl DryRunActuator {
    pub fn new(initial: ReplicaCount) -> Self {
        Self {
            replicas: AtomicI32::new(initial),
        }
    }
}

#[async_trait]
impl Actuator for DryRunActuator {
    async fn current_replicas(&self) -> Result<ReplicaCount, ActuatorError> {
        Ok(self.replicas.load(Ordering::Relaxed))
    }

    async fn set_replicas(&self, target: ReplicaCount) -> Result<(), ActuatorError> {
        let previous = self.replicas.swap(target, Ordering::Relaxed);
        info!(from = previous, to = target, "dry run: replica change not applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_remembers_last_target() {
        let actuator = DryRunActuator::new(2);
        assert_eq!(actuator.current_replicas().await.unwrap(), 2);

        actuator.set_replicas(5).await.unwrap();
        assert_eq!(actuator.current_replicas().await.unwrap(), 5);
    }

    #[test]
    fn conflict_message_names_workload() {
        let err = ActuatorError::Conflict {
            workload: "shop/web".to_string(),
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "update of shop/web kept conflicting after 3 attempts"
        );
    }
}
