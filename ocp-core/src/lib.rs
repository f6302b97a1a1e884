pub mod conditions;
pub mod constants;
pub mod errors;
pub mod health;
pub mod k8s;
pub mod logging;
pub mod macros;
pub mod readiness;
pub mod scale;
pub mod watch;

pub mod prelude {
    pub use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
    pub use kube::ResourceExt;
    pub use kube::api::DynamicObject;

    pub use crate::conditions::{
        Condition,
        ConditionStatus,
    };
    pub use crate::constants::*;
    pub use crate::errors::EmptyResult;
    pub use crate::k8s::{
        ResourceClient,
        ResourceKind,
        ResourceRef,
        ResourceSnapshot,
    };
    pub use crate::readiness::PollOutcome;
}
