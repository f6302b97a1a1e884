use std::collections::BTreeMap;

use kube::api::{
    ListParams,
    WatchParams,
};
use kube::error::ErrorResponse;
use serde_json::{
    Value,
    json,
};

use super::*;

// Label and field selectors in their apiserver string form, e.g. "app=foo,tier!=db"
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Selector {
    pub labels: Option<String>,
    pub fields: Option<String>,
}

impl Selector {
    pub fn labels(sel: &str) -> Selector {
        Selector { labels: Some(sel.into()), fields: None }
    }

    pub fn fields(sel: &str) -> Selector {
        Selector { labels: None, fields: Some(sel.into()) }
    }

    pub fn name(name: &str) -> Selector {
        Selector::fields(&format!("metadata.name={name}"))
    }

    pub fn list_params(&self) -> ListParams {
        let mut lp = ListParams::default();
        if let Some(labels) = &self.labels {
            lp = lp.labels(labels);
        }
        if let Some(fields) = &self.fields {
            lp = lp.fields(fields);
        }
        lp
    }

    pub fn watch_params(&self) -> WatchParams {
        let mut wp = WatchParams::default();
        if let Some(labels) = &self.labels {
            wp = wp.labels(labels);
        }
        if let Some(fields) = &self.fields {
            wp = wp.fields(fields);
        }
        wp
    }
}

pub fn label_selector_from(labels: &BTreeMap<String, String>) -> String {
    labels.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(",")
}

pub fn build_label_patch(labels: &BTreeMap<String, String>) -> Value {
    json!({"metadata": {"labels": labels}})
}

pub fn build_replicas_patch(replicas: i64) -> Value {
    json!({"spec": {"replicas": replicas}})
}

// Map transport errors onto the harness error taxonomy; the original kube::Error is kept around as
// the root cause so nothing gets lost in the logs
pub fn classify_kube_error(err: kube::Error, what: &ResourceRef) -> anyhow::Error {
    let desc = what.to_string();
    let class = match &err {
        kube::Error::Api(ErrorResponse { code: 404, .. }) => ClusterError::NotFound(desc),
        kube::Error::Api(ErrorResponse { code: 409, .. }) => ClusterError::AlreadyExists(desc),
        kube::Error::Api(ErrorResponse { code: 422, .. }) => ClusterError::InvalidParameter(desc),
        _ => ClusterError::Transport(desc),
    };
    anyhow::Error::from(err).context(class)
}

pub fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<ClusterError>(), Some(ClusterError::NotFound(..)))
}

pub fn is_already_exists(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<ClusterError>(), Some(ClusterError::AlreadyExists(..)))
}
