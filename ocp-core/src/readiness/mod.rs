pub mod predicates;

use std::time::Duration;

use clockabilly::prelude::*;
use futures::StreamExt;
use tracing::*;

use crate::conditions;
use crate::errors::*;
use crate::k8s::{
    CATALOG_SOURCE,
    CLUSTER_SERVICE_VERSION,
    CLUSTER_VERSION,
    DEPLOYMENT_CONFIG,
    MACHINE,
    MACHINE_SET,
    NODE,
    PACKAGE_MANIFEST,
    PIPELINE_RUN,
    POD,
    PROJECT,
    SUBSCRIPTION,
    Selector,
};
use crate::prelude::*;
use crate::watch::{
    Event,
    EventType,
    EventWatcher,
    WatchTarget,
};

err_impl! {PollError,
    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("watch failed: {0}")]
    Watch(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    Ready(ResourceSnapshot),
    Timeout,
    Error(String),
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready(_))
    }

    // For callers where anything short of Ready is fatal
    pub fn into_result(self, what: &str) -> anyhow::Result<ResourceSnapshot> {
        match self {
            PollOutcome::Ready(obj) => Ok(obj),
            PollOutcome::Timeout => Err(PollError::timeout(what)),
            PollOutcome::Error(reason) => Err(PollError::watch(&format!("{what}: {reason}"))),
        }
    }
}

// Readiness predicates only ever look at live objects; a DELETED event carries the final state of
// the object, which says nothing about whether it's ready
fn live<P: Fn(&ResourceSnapshot) -> bool>(pred: P) -> impl Fn(&Event) -> bool {
    move |evt| evt.type_ != EventType::Deleted && pred(&evt.object)
}

fn deleted(name: &str) -> impl Fn(&Event) -> bool + use<> {
    let name = name.to_string();
    move |evt| evt.type_ == EventType::Deleted && evt.object.name() == name
}

#[derive(Clone)]
pub struct ReadinessPoller {
    client: ResourceClient,
}

impl ReadinessPoller {
    pub fn new(client: ResourceClient) -> ReadinessPoller {
        ReadinessPoller { client }
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    pub fn watcher(
        &self,
        kind: &ResourceKind,
        ns: Option<&str>,
        target: WatchTarget,
        timeout: Duration,
    ) -> EventWatcher {
        EventWatcher::new(&self.client, kind, ns, target, timeout)
    }

    // Waiting -> {Ready, Timeout, Error}: Ready as soon as any event satisfies the predicate, Error
    // if the watch breaks, and Timeout if the watch runs out without either of those happening
    pub async fn poll<P: Fn(&Event) -> bool>(&self, watcher: EventWatcher, pred: P) -> PollOutcome {
        let what = watcher.description().to_string();
        let budget = watcher.budget();
        let mut events = watcher.events();
        let mut last_seen: Option<ResourceSnapshot> = None;

        while let Some(res) = events.next().await {
            match res {
                Ok(evt) if pred(&evt) => {
                    debug!("{what} is ready ({} event)", evt.type_);
                    return PollOutcome::Ready(evt.object);
                },
                Ok(evt) => {
                    trace!("{what} not ready yet: {}", conditions::summarize(&evt.object.conditions));
                    last_seen = Some(evt.object);
                },
                Err(err) => {
                    warn!("watch on {what} failed: {err:#}");
                    return PollOutcome::Error(format!("{err:#}"));
                },
            }
        }

        match last_seen {
            Some(obj) => warn!(
                "timed out after {}s waiting for {what}; last observed conditions: {}",
                budget.as_secs(),
                conditions::summarize(&obj.conditions)
            ),
            None => warn!("timed out after {}s waiting for {what}; no events observed", budget.as_secs()),
        }
        PollOutcome::Timeout
    }

    pub async fn is_node_ready(&self, name: &str, timeout: Duration) -> bool {
        let watcher = self.watcher(&NODE, None, WatchTarget::Name(name.into()), timeout);
        self.poll(watcher, live(predicates::node_ready)).await.is_ready()
    }

    pub async fn is_pod_ready(&self, name: &str, ns: &str, timeout: Duration) -> bool {
        let watcher = self.watcher(&POD, Some(ns), WatchTarget::Name(name.into()), timeout);
        self.poll(watcher, live(predicates::pod_ready)).await.is_ready()
    }

    pub async fn wait_for_deployment_config(&self, name: &str, ns: &str, timeout: Duration) -> PollOutcome {
        let watcher = self.watcher(&DEPLOYMENT_CONFIG, Some(ns), WatchTarget::Name(name.into()), timeout);
        self.poll(watcher, live(predicates::deployment_config_ready)).await
    }

    pub async fn wait_for_pipeline_run(&self, name: &str, ns: &str, timeout: Duration) -> PollOutcome {
        let watcher = self.watcher(&PIPELINE_RUN, Some(ns), WatchTarget::Name(name.into()), timeout);
        self.poll(watcher, live(predicates::pipeline_run_succeeded)).await
    }

    pub async fn wait_for_machine_set_replicas(&self, name: &str, timeout: Duration) -> PollOutcome {
        let watcher = self.watcher(&MACHINE_SET, Some(MACHINE_API_NS), WatchTarget::Name(name.into()), timeout);
        self.poll(watcher, live(predicates::machine_set_replicas_match)).await
    }

    pub async fn wait_for_machine_set_scaled(&self, name: &str, desired: i64, timeout: Duration) -> PollOutcome {
        let watcher = self.watcher(&MACHINE_SET, Some(MACHINE_API_NS), WatchTarget::Name(name.into()), timeout);
        self.poll(watcher, live(predicates::machine_set_replicas_are(desired))).await
    }

    pub async fn wait_for_machine_phase(&self, name: &str, phase: &str, timeout: Duration) -> PollOutcome {
        let watcher = self.watcher(&MACHINE, Some(MACHINE_API_NS), WatchTarget::Name(name.into()), timeout);
        self.poll(watcher, live(predicates::machine_phase_is(phase))).await
    }

    pub async fn does_project_exist(&self, name: &str) -> bool {
        self.client.exists(&PROJECT, None, name).await
    }

    // The phase event on its own isn't trusted; a direct lookup has to agree before we call the
    // project active
    pub async fn wait_for_project_active(&self, name: &str, timeout: Duration) -> PollOutcome {
        let target = WatchTarget::Selector(Selector::fields("status.phase=Active"));
        let watcher = self.watcher(&PROJECT, None, target, timeout);
        let outcome = self.poll(watcher, live(predicates::name_is(name))).await;
        if outcome.is_ready() && !self.does_project_exist(name).await {
            return PollOutcome::Error(format!("project {name} reported Active but could not be found"));
        }
        outcome
    }

    pub async fn wait_for_project_deleted(&self, name: &str, timeout: Duration) -> anyhow::Result<bool> {
        self.wait_for_deleted(&PROJECT, None, name, timeout).await
    }

    // Deletion is only confirmed by a direct lookup; the DELETED event just tells us when to look
    pub async fn wait_for_deleted(
        &self,
        kind: &ResourceKind,
        ns: Option<&str>,
        name: &str,
        timeout: Duration,
    ) -> anyhow::Result<bool> {
        let obj_ref = ResourceRef::new(kind, ns, name);
        let Some(current) = self.client.get_opt(kind, ns, name).await? else {
            debug!("{obj_ref} is already gone");
            return Ok(true);
        };

        // Watching from the version we just looked at means a deletion that lands in between
        // still shows up as an event
        let mut watcher = self.watcher(kind, ns, WatchTarget::Name(name.into()), timeout);
        if let Some(rv) = current.metadata.resource_version.as_deref() {
            watcher = watcher.starting_at(rv);
        }
        if let PollOutcome::Error(reason) = self.poll(watcher, deleted(name)).await {
            bail!(PollError::Watch(format!("{obj_ref}: {reason}")));
        }

        let gone = self.client.get_opt(kind, ns, name).await?.is_none();
        if gone {
            info!("{obj_ref} deleted");
        } else {
            warn!("{obj_ref} still present after {}s", timeout.as_secs());
        }
        Ok(gone)
    }

    pub async fn wait_for_catalog_source(&self, name: &str, ns: &str, timeout: Duration) -> PollOutcome {
        self.wait_for_named(&CATALOG_SOURCE, name, ns, timeout).await
    }

    pub async fn wait_for_subscription(&self, name: &str, ns: &str, timeout: Duration) -> PollOutcome {
        self.wait_for_named(&SUBSCRIPTION, name, ns, timeout).await
    }

    pub async fn wait_for_csv(&self, name: &str, ns: &str, timeout: Duration) -> PollOutcome {
        self.wait_for_named(&CLUSTER_SERVICE_VERSION, name, ns, timeout).await
    }

    pub async fn wait_for_cluster_version_upgrade(&self, version: &str, timeout: Duration) -> PollOutcome {
        let target = WatchTarget::Name(CLUSTER_VERSION_NAME.into());
        let watcher = self.watcher(&CLUSTER_VERSION, None, target, timeout);
        self.poll(watcher, live(predicates::cluster_version_upgraded(version))).await
    }

    // Package manifests are served by an aggregated API that doesn't support watches, so this one
    // polls instead
    pub async fn wait_for_package_manifest(
        &self,
        name: &str,
        ns: &str,
        timeout_seconds: i64,
        clock: Box<dyn Clockable + Send>,
    ) -> anyhow::Result<bool> {
        let deadline = clock.now_ts() + timeout_seconds;
        loop {
            if self.client.get_opt(&PACKAGE_MANIFEST, Some(ns), name).await?.is_some() {
                info!("package manifest {ns}/{name} is available");
                return Ok(true);
            }
            if clock.now_ts() + PACKAGE_MANIFEST_POLL_SECONDS > deadline {
                warn!("package manifest {ns}/{name} did not show up within {timeout_seconds}s");
                return Ok(false);
            }
            clock.sleep(PACKAGE_MANIFEST_POLL_SECONDS).await;
        }
    }

    // Operator objects count as present as soon as any event for the named object comes through
    async fn wait_for_named(&self, kind: &ResourceKind, name: &str, ns: &str, timeout: Duration) -> PollOutcome {
        let watcher = self.watcher(kind, Some(ns), WatchTarget::Selector(Selector::default()), timeout);
        self.poll(watcher, live(predicates::name_is(name))).await
    }
}

#[cfg(test)]
mod tests;
