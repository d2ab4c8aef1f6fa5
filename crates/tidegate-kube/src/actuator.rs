//! Kubernetes Deployment actuator.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, PostParams};
use kube::Client;
use tracing::{debug, info};

use tidegate_autoscale::{Actuator, ActuatorError};
use tidegate_core::ReplicaCount;

use crate::retry::with_conflict_retry;

/// Attempts made for one replica change before giving up on conflicts.
pub const MAX_ATTEMPTS: u32 = 3;

/// Scales one `apps/v1` Deployment.
pub struct KubeActuator {
    api: Api<Deployment>,
    namespace: String,
    name: String,
    max_attempts: u32,
}

impl KubeActuator {
    pub fn new(client: Client, namespace: &str, name: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
            name: name.to_string(),
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Build a client from the in-cluster service account or local kubeconfig.
    pub async fn from_environment(namespace: &str, name: &str) -> Result<Self, kube::Error> {
        let client = Client::try_default().await?;
        Ok(Self::new(client, namespace, name))
    }

    fn workload(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// One read → mutate → replace cycle.
    async fn apply_once(&self, target: ReplicaCount, attempt: u32) -> Result<(), kube::Error> {
        let mut deployment = self.api.get(&self.name).await?;
        let spec = deployment.spec.get_or_insert_with(Default::default);
        debug!(
            workload = %self.workload(),
            attempt,
            live = ?spec.replicas,
            target,
            "replacing deployment replicas"
        );
        spec.replicas = Some(target);
        self.api
            .replace(&self.name, &PostParams::default(), &deployment)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Actuator for KubeActuator {
    async fn current_replicas(&self) -> Result<ReplicaCount, ActuatorError> {
        let workload = self.workload();
        let deployment = self
            .api
            .get(&self.name)
            .await
            .map_err(|e| classify(e, &workload))?;

        deployment
            .spec
            .and_then(|spec| spec.replicas)
            .ok_or_else(|| ActuatorError::NotFound(format!("{workload}: spec.replicas unset")))
    }

    async fn set_replicas(&self, target: ReplicaCount) -> Result<(), ActuatorError> {
        let workload = self.workload();
        let result = with_conflict_retry(self.max_attempts, is_conflict, |attempt| {
            self.apply_once(target, attempt)
        })
        .await;

        match result {
            Ok(()) => {
                info!(%workload, target, "deployment replicas updated");
                Ok(())
            }
            Err(failure) if is_conflict(&failure.error) => Err(ActuatorError::Conflict {
                workload,
                attempts: failure.attempts,
            }),
            Err(failure) => Err(classify(failure.error, &workload)),
        }
    }
}

fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 409)
}

fn classify(err: kube::Error, workload: &str) -> ActuatorError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 => ActuatorError::NotFound(workload.to_string()),
        other => ActuatorError::Api(other.to_string()),
    }
}
