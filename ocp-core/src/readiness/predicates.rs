use crate::conditions::{
    self,
    ConditionStatus,
};
use crate::prelude::*;

// Node conditions are only meaningful in their last entry
pub fn node_ready(obj: &ResourceSnapshot) -> bool {
    conditions::evaluate_last(&obj.conditions, READY_CONDITION, ConditionStatus::True)
}

pub fn pod_ready(obj: &ResourceSnapshot) -> bool {
    obj.conditions
        .iter()
        .any(|c| c.is(READY_CONDITION, ConditionStatus::True))
}

// Both conditions have to hold in the same snapshot; an Available=True from one event and a
// Progressing=True from a later one doesn't count
pub fn deployment_config_ready(obj: &ResourceSnapshot) -> bool {
    let available = conditions::evaluate(&obj.conditions, AVAILABLE_CONDITION, ConditionStatus::True);
    let progressing = conditions::evaluate(&obj.conditions, PROGRESSING_CONDITION, ConditionStatus::True);
    available && progressing
}

pub fn deployment_config_failed(obj: &ResourceSnapshot) -> bool {
    let available = conditions::evaluate(&obj.conditions, AVAILABLE_CONDITION, ConditionStatus::False);
    let progressing = conditions::evaluate(&obj.conditions, PROGRESSING_CONDITION, ConditionStatus::False);
    available && progressing
}

pub fn pipeline_run_succeeded(obj: &ResourceSnapshot) -> bool {
    obj.conditions
        .iter()
        .any(|c| c.is(SUCCEEDED_CONDITION, ConditionStatus::True))
}

pub fn machine_set_replicas_match(obj: &ResourceSnapshot) -> bool {
    match (obj.status_i64("/replicas"), obj.status_i64("/readyReplicas")) {
        (Some(replicas), Some(ready)) => replicas == ready,
        // readyReplicas is omitted entirely when it's zero
        (Some(replicas), None) => replicas == 0,
        _ => false,
    }
}

pub fn machine_set_replicas_are(desired: i64) -> impl Fn(&ResourceSnapshot) -> bool {
    move |obj| obj.status_i64("/replicas").unwrap_or_default() == desired
}

pub fn machine_phase_is(phase: &str) -> impl Fn(&ResourceSnapshot) -> bool + use<> {
    let phase = phase.to_string();
    move |obj| obj.phase() == Some(phase.as_str())
}

pub fn project_phase_is(phase: &str) -> impl Fn(&ResourceSnapshot) -> bool + use<> {
    machine_phase_is(phase)
}

pub fn name_is(name: &str) -> impl Fn(&ResourceSnapshot) -> bool + use<> {
    let name = name.to_string();
    move |obj| obj.metadata.name.as_deref() == Some(name.as_str())
}

// Upgrades are done once the most recent condition transition is to Available=True and the
// operator reports the version we asked for
pub fn cluster_version_upgraded(version: &str) -> impl Fn(&ResourceSnapshot) -> bool + use<> {
    let version = version.to_string();
    move |obj| {
        let latest_available =
            conditions::latest(&obj.conditions).is_some_and(|c| c.is(AVAILABLE_CONDITION, ConditionStatus::True));
        latest_available && obj.status_str("/desired/version") == Some(version.as_str())
    }
}
