use std::fmt;
use std::time::Duration;

use tracing::*;

use crate::errors::*;
use crate::k8s::{
    MACHINE,
    MACHINE_SET,
    NODE,
    Selector,
    build_replicas_patch,
};
use crate::prelude::*;
use crate::readiness::ReadinessPoller;

err_impl! {VerificationError,
    #[error("machine set {0} never reported the requested number of replicas")]
    ReplicaMismatch(String),

    #[error("machine {0} did not reach the Running phase")]
    MachineNotRunning(String),

    #[error("node {0} did not become Ready")]
    NodeNotReady(String),

    #[error("machine {0} was not deleted")]
    MachineNotDeleted(String),

    #[error("node {0} was not deleted")]
    NodeNotDeleted(String),

    #[error("machine {0} has no node reference")]
    MissingNodeRef(String),

    #[error("machine set {0} does not have the expected number of machines in transition")]
    MachineCountMismatch(String),

    #[error("deployment config {0} did not become ready in time")]
    DeploymentConfigTimeout(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MachinePhase {
    Provisioning,
    Provisioned,
    Running,
    Deleting,
    Deleted,
    Failed,
    Other(String),
}

impl MachinePhase {
    // A brand-new machine doesn't have a phase at all until the machine controller picks it up
    pub fn from_status(phase: Option<&str>) -> MachinePhase {
        match phase {
            None | Some("Provisioning") => MachinePhase::Provisioning,
            Some("Provisioned") => MachinePhase::Provisioned,
            Some("Running") => MachinePhase::Running,
            Some("Deleting") => MachinePhase::Deleting,
            Some("Deleted") => MachinePhase::Deleted,
            Some("Failed") => MachinePhase::Failed,
            Some(other) => MachinePhase::Other(other.into()),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, MachinePhase::Provisioning | MachinePhase::Provisioned)
    }
}

impl fmt::Display for MachinePhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MachinePhase::Other(phase) => write!(f, "{phase}"),
            phase => write!(f, "{phase:?}"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MachineLifecycleRecord {
    pub name: String,
    pub phase: MachinePhase,
    pub node_ref: Option<String>,
}

impl From<&ResourceSnapshot> for MachineLifecycleRecord {
    fn from(machine: &ResourceSnapshot) -> MachineLifecycleRecord {
        MachineLifecycleRecord {
            name: machine.name(),
            phase: MachinePhase::from_status(machine.phase()),
            node_ref: machine.node_ref().map(String::from),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScaleResult {
    AlreadySatisfied,
    ScaledUp(Vec<MachineLifecycleRecord>),
    ScaledDown(Vec<MachineLifecycleRecord>),
}

// A ScaleVerifier changes the size of a machine set and then checks that the cluster actually
// followed through: new machines have to come up Running with Ready nodes, and removed machines
// (and their nodes) have to be gone when looked up directly.  Anything short of that is an error;
// there's no partial success.
pub struct ScaleVerifier {
    poller: ReadinessPoller,
}

impl ScaleVerifier {
    pub fn new(client: ResourceClient) -> ScaleVerifier {
        ScaleVerifier { poller: ReadinessPoller::new(client) }
    }

    fn client(&self) -> &ResourceClient {
        self.poller.client()
    }

    pub async fn current_replicas(&self, machine_set: &str) -> anyhow::Result<i64> {
        let ms = self.client().get(&MACHINE_SET, Some(MACHINE_API_NS), machine_set).await?;
        Ok(ms.spec_i64("/replicas").unwrap_or_default())
    }

    pub async fn machines_of(&self, machine_set: &str) -> anyhow::Result<Vec<MachineLifecycleRecord>> {
        let sel = Selector::labels(&format!("{MACHINE_SET_LABEL_KEY}={machine_set}"));
        let machines = self.client().list(&MACHINE, Some(MACHINE_API_NS), &sel).await?;
        Ok(machines.iter().map(MachineLifecycleRecord::from).collect())
    }

    #[instrument(skip(self, timeout))]
    pub async fn scale(&self, machine_set: &str, desired: i64, timeout: Duration) -> anyhow::Result<ScaleResult> {
        let current = self.current_replicas(machine_set).await?;
        if current == desired {
            info!("machine set {machine_set} already has {desired} replicas, nothing to do");
            return Ok(ScaleResult::AlreadySatisfied);
        }

        info!("scaling machine set {machine_set} from {current} to {desired} replicas");
        self.client()
            .patch(&MACHINE_SET, Some(MACHINE_API_NS), machine_set, &build_replicas_patch(desired))
            .await?;

        if !self
            .poller
            .wait_for_machine_set_scaled(machine_set, desired, timeout)
            .await
            .is_ready()
        {
            bail!(VerificationError::ReplicaMismatch(format!("{machine_set} (wanted {desired})")));
        }

        let machines = self.machines_of(machine_set).await?;
        let expected = desired.abs_diff(current) as usize;
        if desired > current {
            Ok(ScaleResult::ScaledUp(self.verify_scale_up(machine_set, machines, expected).await?))
        } else {
            Ok(ScaleResult::ScaledDown(self.verify_scale_down(machine_set, machines, expected).await?))
        }
    }

    async fn verify_scale_up(
        &self,
        machine_set: &str,
        machines: Vec<MachineLifecycleRecord>,
        expected: usize,
    ) -> anyhow::Result<Vec<MachineLifecycleRecord>> {
        let mut new_machines: Vec<_> = machines.into_iter().filter(|m| m.phase.is_new()).collect();
        if new_machines.len() != expected {
            bail!(VerificationError::MachineCountMismatch(format!(
                "{machine_set} (expected {expected} new, found {})",
                new_machines.len()
            )));
        }
        info!("waiting for {} new machine(s) to start running", new_machines.len());

        let running = MachinePhase::Running.to_string();
        let machine_timeout = Duration::from_secs(MACHINE_RUNNING_TIMEOUT_SECONDS);
        for machine in new_machines.iter_mut() {
            let outcome = self.poller.wait_for_machine_phase(&machine.name, &running, machine_timeout).await;
            let Ok(snapshot) = outcome.into_result(&machine.name) else {
                bail!(VerificationError::MachineNotRunning(machine.name.clone()));
            };
            machine.phase = MachinePhase::Running;
            machine.node_ref = snapshot.node_ref().map(String::from);
        }

        let node_timeout = Duration::from_secs(NODE_READY_TIMEOUT_SECONDS);
        for machine in new_machines.iter() {
            let Some(node) = machine.node_ref.as_deref() else {
                bail!(VerificationError::MissingNodeRef(machine.name.clone()));
            };
            if !self.poller.is_node_ready(node, node_timeout).await {
                bail!(VerificationError::NodeNotReady(node.into()));
            }
            info!("machine {} is running on node {node}", machine.name);
        }

        Ok(new_machines)
    }

    // The node references have to be collected before the machines go away, since the machine
    // object is the only place that records them
    async fn verify_scale_down(
        &self,
        machine_set: &str,
        machines: Vec<MachineLifecycleRecord>,
        expected: usize,
    ) -> anyhow::Result<Vec<MachineLifecycleRecord>> {
        let deleting: Vec<_> = machines
            .into_iter()
            .filter(|m| m.phase == MachinePhase::Deleting)
            .collect();
        if deleting.len() != expected {
            bail!(VerificationError::MachineCountMismatch(format!(
                "{machine_set} (expected {expected} deleting, found {})",
                deleting.len()
            )));
        }
        info!("waiting for {} machine(s) to be deleted", deleting.len());

        let nodes: Vec<_> = deleting
            .iter()
            .filter_map(|m| match &m.node_ref {
                Some(node) => Some(node.clone()),
                None => {
                    warn!("machine {} is being deleted but never had a node", m.name);
                    None
                },
            })
            .collect();

        let machine_timeout = Duration::from_secs(MACHINE_DELETE_TIMEOUT_SECONDS);
        for machine in deleting.iter() {
            if !self
                .poller
                .wait_for_deleted(&MACHINE, Some(MACHINE_API_NS), &machine.name, machine_timeout)
                .await?
            {
                bail!(VerificationError::MachineNotDeleted(machine.name.clone()));
            }
        }

        let node_timeout = Duration::from_secs(NODE_DELETE_TIMEOUT_SECONDS);
        for node in nodes.iter() {
            if !self.poller.wait_for_deleted(&NODE, None, node, node_timeout).await? {
                bail!(VerificationError::NodeNotDeleted(node.clone()));
            }
        }

        Ok(deleting)
    }
}

#[cfg(test)]
mod tests;
