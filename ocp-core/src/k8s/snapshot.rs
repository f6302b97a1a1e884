use std::collections::BTreeMap;

use kube::api::{
    DynamicObject,
    TypeMeta,
};
use serde_json::Value;

use super::ResourceRef;
use crate::conditions::{
    Condition,
    parse_conditions,
};
use crate::prelude::*;

// The apiserver hands back untyped JSON for every OpenShift kind we care about; a ResourceSnapshot
// pulls out the handful of pieces the readiness and health logic actually reads (metadata, spec,
// status and the parsed condition list) so that the rest of the code doesn't have to go poking
// through serde_json::Value trees.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceSnapshot {
    pub types: Option<TypeMeta>,
    pub metadata: metav1::ObjectMeta,
    pub spec: Value,
    pub status: Value,
    pub conditions: Vec<Condition>,
}

impl ResourceSnapshot {
    pub fn name(&self) -> String {
        self.metadata.name.clone().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        self.metadata.labels.clone().unwrap_or_default()
    }

    // Pointers are JSON pointers relative to .spec / .status, e.g. "/replicas" or "/nodeRef/name"
    pub fn spec_i64(&self, ptr: &str) -> Option<i64> {
        self.spec.pointer(ptr).and_then(Value::as_i64)
    }

    pub fn status_i64(&self, ptr: &str) -> Option<i64> {
        self.status.pointer(ptr).and_then(Value::as_i64)
    }

    pub fn spec_str(&self, ptr: &str) -> Option<&str> {
        self.spec.pointer(ptr).and_then(Value::as_str)
    }

    pub fn status_str(&self, ptr: &str) -> Option<&str> {
        self.status.pointer(ptr).and_then(Value::as_str)
    }

    pub fn phase(&self) -> Option<&str> {
        self.status_str("/phase")
    }

    pub fn node_ref(&self) -> Option<&str> {
        self.status_str("/nodeRef/name")
    }

    pub fn to_ref(&self) -> ResourceRef {
        let (api_version, kind) = match &self.types {
            Some(tm) => (tm.api_version.clone(), tm.kind.clone()),
            None => (String::new(), String::new()),
        };
        ResourceRef {
            kind,
            api_version,
            namespace: self.metadata.namespace.clone(),
            name: self.name(),
        }
    }
}

impl From<DynamicObject> for ResourceSnapshot {
    fn from(obj: DynamicObject) -> ResourceSnapshot {
        let DynamicObject { types, metadata, mut data } = obj;
        let spec = data.get_mut("spec").map(Value::take).unwrap_or(Value::Null);
        let status = data.get_mut("status").map(Value::take).unwrap_or(Value::Null);

        // ComponentStatus is the odd one out and keeps its conditions at the top level
        let conditions = match status.get("conditions") {
            Some(conds) => parse_conditions(conds),
            None => data.get("conditions").map(parse_conditions).unwrap_or_default(),
        };

        ResourceSnapshot { types, metadata, spec, status, conditions }
    }
}
