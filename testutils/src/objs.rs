use std::collections::BTreeMap;

use kube::api::DynamicObject;
use kube::discovery::ApiResource;
use rstest::fixture;
use serde_json::{
    Value,
    json,
};

use crate::constants::*;

pub fn conditions(conds: &[(&str, &str)]) -> Value {
    Value::Array(
        conds
            .iter()
            .map(|(type_, status)| json!({"type": type_, "status": status}))
            .collect(),
    )
}

pub fn condition_with_message(type_: &str, status: &str, message: &str) -> Value {
    json!({"type": type_, "status": status, "message": message})
}

pub fn condition_at(type_: &str, status: &str, transition_time: &str) -> Value {
    json!({"type": type_, "status": status, "lastTransitionTime": transition_time})
}

pub fn with_labels(mut obj: DynamicObject, labels: &[(&str, &str)]) -> DynamicObject {
    let existing = obj.metadata.labels.get_or_insert_with(BTreeMap::new);
    for (k, v) in labels {
        existing.insert(k.to_string(), v.to_string());
    }
    obj
}

pub fn with_resource_version(mut obj: DynamicObject, rv: &str) -> DynamicObject {
    obj.metadata.resource_version = Some(rv.into());
    obj
}

// Wraps a set of objects up like the response to a LIST call
pub fn list_of(ar: &ApiResource, items: Vec<DynamicObject>) -> Value {
    json!({
        "apiVersion": ar.api_version,
        "kind": format!("{}List", ar.kind),
        "metadata": {"resourceVersion": "1"},
        "items": items,
    })
}

pub fn named(ar: &ApiResource, ns: Option<&str>, name: &str, status: Value) -> DynamicObject {
    let obj = DynamicObject::new(name, ar).data(json!({"spec": {}, "status": status}));
    match ns {
        Some(ns) => obj.within(ns),
        None => obj,
    }
}

pub fn test_node(name: &str, conds: Value) -> DynamicObject {
    named(&NODE_AR, None, name, json!({"conditions": conds}))
}

#[fixture]
pub fn ready_node(#[default(TEST_NODE)] name: &str) -> DynamicObject {
    test_node(
        name,
        conditions(&[
            ("MemoryPressure", "False"),
            ("DiskPressure", "False"),
            ("PIDPressure", "False"),
            ("Ready", "True"),
        ]),
    )
}

pub fn test_pod(name: &str, ns: &str, ready: &str) -> DynamicObject {
    named(
        &POD_AR,
        Some(ns),
        name,
        json!({
            "phase": "Running",
            "conditions": conditions(&[("Initialized", "True"), ("Ready", ready), ("PodScheduled", "True")]),
        }),
    )
}

pub fn test_deployment(name: &str, ns: &str, replicas: i64, available: i64, ready: i64) -> DynamicObject {
    DynamicObject::new(name, &DEPLOYMENT_AR).within(ns).data(json!({
        "spec": {"replicas": replicas},
        "status": {"replicas": replicas, "availableReplicas": available, "readyReplicas": ready},
    }))
}

pub fn test_deployment_config(name: &str, ns: &str, available: &str, progressing: &str) -> DynamicObject {
    DynamicObject::new(name, &DEPLOYMENT_CONFIG_AR).within(ns).data(json!({
        "spec": {"replicas": 1},
        "status": {
            "conditions": conditions(&[("Available", available), ("Progressing", progressing)]),
        },
    }))
}

#[fixture]
pub fn ready_deployment_config(#[default(TEST_DEPLOYMENT_CONFIG)] name: &str) -> DynamicObject {
    test_deployment_config(name, TEST_NAMESPACE, "True", "True")
}

pub fn test_machine_set(name: &str, spec_replicas: i64, replicas: i64, ready_replicas: i64) -> DynamicObject {
    DynamicObject::new(name, &MACHINE_SET_AR)
        .within(TEST_MACHINE_NAMESPACE)
        .data(json!({
            "spec": {"replicas": spec_replicas},
            "status": {"replicas": replicas, "readyReplicas": ready_replicas},
        }))
}

pub fn test_machine(name: &str, machine_set: &str, phase: Option<&str>, node: Option<&str>) -> DynamicObject {
    let mut status = json!({});
    if let Some(phase) = phase {
        status["phase"] = json!(phase);
    }
    if let Some(node) = node {
        status["nodeRef"] = json!({"kind": "Node", "name": node});
    }
    let obj = DynamicObject::new(name, &MACHINE_AR)
        .within(TEST_MACHINE_NAMESPACE)
        .data(json!({"spec": {}, "status": status}));
    with_labels(obj, &[("machine.openshift.io/cluster-api-machineset", machine_set)])
}

pub fn test_project(name: &str, phase: &str) -> DynamicObject {
    named(&PROJECT_AR, None, name, json!({"phase": phase}))
}

pub fn test_cluster_version(desired: &str, conds: Value) -> DynamicObject {
    DynamicObject::new("version", &CLUSTER_VERSION_AR).data(json!({
        "spec": {"channel": "stable-4.16"},
        "status": {"desired": {"version": desired}, "conditions": conds},
    }))
}

pub fn test_cluster_operator(name: &str, available: &str) -> DynamicObject {
    named(
        &CLUSTER_OPERATOR_AR,
        None,
        name,
        json!({"conditions": conditions(&[("Available", available), ("Degraded", "False")])}),
    )
}

// ComponentStatus keeps its conditions at the top level instead of under status
pub fn test_component_status(name: &str, healthy: &str) -> DynamicObject {
    DynamicObject::new(name, &COMPONENT_STATUS_AR).data(json!({
        "conditions": [{"type": "Healthy", "status": healthy, "message": "{\"health\":\"true\"}"}],
    }))
}

pub fn test_registry_config(management_state: &str, storage: Value) -> DynamicObject {
    DynamicObject::new("cluster", &REGISTRY_CONFIG_AR).data(json!({
        "spec": {"managementState": management_state, "storage": storage},
        "status": {},
    }))
}
