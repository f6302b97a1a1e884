use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{
    Map,
    Value,
    json,
};

use crate::conditions::{
    self,
    ConditionStatus,
};
use crate::prelude::*;

pub const NODES_COMPONENT: &str = "nodes";
pub const ROUTER_COMPONENT: &str = "router";
pub const IMAGE_REGISTRY_COMPONENT: &str = "image_registry";
pub const API_SERVER_COMPONENT: &str = "api_server";
pub const WEB_CONSOLE_COMPONENT: &str = "web_console";
pub const CLUSTER_VERSION_COMPONENT: &str = "cluster_version";
pub const CONTROL_PLANE_COMPONENT: &str = "control_plane";
pub const CLUSTER_OPERATORS_COMPONENT: &str = "cluster_operators";

const IMAGE_REGISTRY_POD_PREFIXES: [&str; 2] = [IMAGE_REGISTRY_DEPLOYMENT, IMAGE_REGISTRY_OPERATOR_DEPLOYMENT];

// A report is healthy exactly when it has nothing to say; the fields are private so that the only
// way to build one is through the constructors below, which keep it that way
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HealthReport {
    component: String,
    healthy: bool,
    detail: BTreeMap<String, Value>,
}

impl HealthReport {
    pub fn from_detail(component: &str, mut detail: BTreeMap<String, Value>, healthy: bool) -> HealthReport {
        if !healthy && detail.is_empty() {
            detail.insert("reason".into(), json!("unhealthy"));
        }
        if healthy {
            detail.clear();
        }
        HealthReport { component: component.into(), healthy, detail }
    }

    pub fn healthy(component: &str) -> HealthReport {
        HealthReport::from_detail(component, BTreeMap::new(), true)
    }

    pub fn unhealthy(component: &str, key: &str, reason: Value) -> HealthReport {
        HealthReport::from_detail(component, BTreeMap::from([(key.into(), reason)]), false)
    }

    // Used when we couldn't even gather the data for a check
    pub fn failed(component: &str, err: &anyhow::Error) -> HealthReport {
        HealthReport::unhealthy(component, "error", json!(format!("{err:#}")))
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub fn detail(&self) -> &BTreeMap<String, Value> {
        &self.detail
    }
}

fn reason(cond: &Condition) -> String {
    if cond.message.is_empty() {
        format!("status is {}", cond.status)
    } else {
        cond.message.clone()
    }
}

fn problem(type_: &str, reason: String) -> Value {
    let mut entry = Map::new();
    entry.insert(type_.into(), Value::String(reason));
    Value::Object(entry)
}

// Every node shows up in the detail when something's wrong (with an empty list if that particular
// node is fine) so the report gives a picture of the whole cluster
pub fn node_health(nodes: &[ResourceSnapshot]) -> HealthReport {
    let mut problems = BTreeMap::new();
    for node in nodes {
        let mut node_problems = vec![];
        for cond in &node.conditions {
            let pressure = NODE_PRESSURE_CONDITIONS.contains(&cond.type_.as_str());
            if pressure && cond.status == ConditionStatus::True {
                node_problems.push(problem(&cond.type_, reason(cond)));
            }
        }

        match conditions::find(&node.conditions, READY_CONDITION) {
            Some(ready) if ready.status == ConditionStatus::True => (),
            Some(ready) => node_problems.push(problem(READY_CONDITION, reason(ready))),
            None => node_problems.push(problem(READY_CONDITION, "no Ready condition reported".into())),
        }
        problems.insert(node.name(), node_problems);
    }

    let healthy = problems.values().all(|p| p.is_empty());
    let detail = problems.into_iter().map(|(name, p)| (name, json!(p))).collect();
    HealthReport::from_detail(NODES_COMPONENT, detail, healthy)
}

fn replicas_consistent(deployment: &ResourceSnapshot) -> bool {
    let replicas = deployment.status_i64("/replicas").unwrap_or_default();
    let available = deployment.status_i64("/availableReplicas").unwrap_or_default();
    let ready = deployment.status_i64("/readyReplicas").unwrap_or_default();
    replicas == available && available == ready
}

fn not_ready_pods<'a>(pods: impl Iterator<Item = &'a ResourceSnapshot>) -> Vec<String> {
    pods.filter(|pod| conditions::evaluate(&pod.conditions, READY_CONDITION, ConditionStatus::False))
        .map(|pod| pod.name())
        .collect()
}

pub fn router_health(pods: &[ResourceSnapshot], deployment: Option<&ResourceSnapshot>) -> HealthReport {
    let bad_pods = not_ready_pods(pods.iter());
    let replicas_match = deployment.is_some_and(replicas_consistent);

    let healthy = bad_pods.is_empty() && replicas_match;
    let detail = BTreeMap::from([
        ("router_pod".to_string(), json!(bad_pods)),
        ("router_replicas".to_string(), json!(replicas_match)),
    ]);
    HealthReport::from_detail(ROUTER_COMPONENT, detail, healthy)
}

// Only the registry itself and its operator count; the namespace also has other pods (e.g., the
// node-ca daemonset) that we don't care about here
pub fn image_registry_health(pods: &[ResourceSnapshot], deployments: &[Option<ResourceSnapshot>]) -> HealthReport {
    let registry_pods = pods
        .iter()
        .filter(|pod| IMAGE_REGISTRY_POD_PREFIXES.iter().any(|p| pod.name().starts_with(p)));
    let bad_pods = not_ready_pods(registry_pods);

    let mut replicas_match = true;
    for deployment in deployments {
        if !deployment.as_ref().is_some_and(replicas_consistent) {
            replicas_match = false;
        }
    }

    let healthy = bad_pods.is_empty() && replicas_match;
    let detail = BTreeMap::from([
        ("image_registry_pods".to_string(), json!(bad_pods)),
        ("image_registry_replicas".to_string(), json!(replicas_match)),
    ]);
    HealthReport::from_detail(IMAGE_REGISTRY_COMPONENT, detail, healthy)
}

pub fn registry_storage_persistent(config: &ResourceSnapshot) -> bool {
    let managed = config.spec_str("/managementState") == Some("Managed");
    let storage = config.spec.pointer("/storage").and_then(Value::as_object);
    let persistent = storage.is_some_and(|s| !s.is_empty() && !s.contains_key("emptyDir"));
    managed && persistent
}

pub fn healthz_health(component: &str, probe: &anyhow::Result<String>) -> HealthReport {
    match probe {
        Ok(_) => HealthReport::healthy(component),
        Err(err) => HealthReport::unhealthy(component, "healthz", json!(format!("{err:#}"))),
    }
}

pub fn cluster_version_health(cv: &ResourceSnapshot) -> HealthReport {
    match conditions::find(&cv.conditions, AVAILABLE_CONDITION) {
        Some(cond) if cond.status == ConditionStatus::True => HealthReport::healthy(CLUSTER_VERSION_COMPONENT),
        Some(cond) => HealthReport::unhealthy(CLUSTER_VERSION_COMPONENT, &cv.name(), json!(reason(cond))),
        None => {
            HealthReport::unhealthy(CLUSTER_VERSION_COMPONENT, &cv.name(), json!("no Available condition reported"))
        },
    }
}

pub fn control_plane_health(statuses: &[ResourceSnapshot]) -> HealthReport {
    let mut detail = BTreeMap::new();
    for cs in statuses {
        match conditions::find(&cs.conditions, HEALTHY_CONDITION) {
            Some(cond) if cond.status == ConditionStatus::True => (),
            Some(cond) => {
                detail.insert(cs.name(), json!(reason(cond)));
            },
            None => {
                detail.insert(cs.name(), json!("no Healthy condition reported"));
            },
        }
    }
    let healthy = detail.is_empty();
    HealthReport::from_detail(CONTROL_PLANE_COMPONENT, detail, healthy)
}

pub fn cluster_operators_health(operators: &[ResourceSnapshot]) -> HealthReport {
    let mut detail = BTreeMap::new();
    for op in operators {
        if let Some(cond) = conditions::find(&op.conditions, AVAILABLE_CONDITION)
            && cond.status == ConditionStatus::False
        {
            detail.insert(op.name(), json!(reason(cond)));
        }
    }
    let healthy = detail.is_empty();
    HealthReport::from_detail(CLUSTER_OPERATORS_COMPONENT, detail, healthy)
}
