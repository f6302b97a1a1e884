mod client;
mod kind;
mod snapshot;
mod util;

use std::fmt;

pub use client::*;
pub use kind::*;
pub use snapshot::*;
pub use util::*;

use crate::errors::*;

err_impl! {ClusterError,
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unknown resource kind: {0}")]
    UnknownKind(String),
}

// A ResourceRef identifies any object in the cluster; it's used for log lines and error messages
// and never changes once it's built.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ResourceRef {
    pub kind: String,
    pub api_version: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceRef {
    pub fn new(kind: &ResourceKind, namespace: Option<&str>, name: &str) -> ResourceRef {
        ResourceRef {
            kind: kind.kind.clone(),
            api_version: kind.api_version(),
            namespace: namespace.filter(|_| kind.is_namespaced()).map(|ns| ns.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {ns}/{}", self.kind, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

#[cfg(test)]
pub mod tests;
