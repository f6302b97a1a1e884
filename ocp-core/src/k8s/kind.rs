use std::fmt;
use std::ops::Deref;

use kube::api::{
    ApiResource,
    GroupVersionKind,
    TypeMeta,
};
use lazy_static::lazy_static;

// ResourceKind wraps a GroupVersionKind together with the two pieces of information we need to
// talk to the apiserver without a discovery round-trip: the plural resource name (used in the URL)
// and whether the resource is namespace-scoped.  Everything the harness touches is listed below;
// anything else (e.g., objects coming out of a template) is resolved through discovery by the
// ResourceClient.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ResourceKind {
    gvk: GroupVersionKind,
    plural: String,
    namespaced: bool,
}

impl ResourceKind {
    pub fn new(group: &str, version: &str, kind: &str, plural: &str, namespaced: bool) -> ResourceKind {
        ResourceKind {
            gvk: GroupVersionKind::gvk(group, version, kind),
            plural: plural.into(),
            namespaced,
        }
    }

    pub fn from_api_resource(ar: &ApiResource, namespaced: bool) -> ResourceKind {
        ResourceKind::new(&ar.group, &ar.version, &ar.kind, &ar.plural, namespaced)
    }

    pub fn well_known(api_version: &str, kind: &str) -> Option<&'static ResourceKind> {
        WELL_KNOWN_KINDS
            .iter()
            .find(|k| k.gvk.kind == kind && k.gvk.api_version() == api_version)
            .copied()
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(&self.gvk, &self.plural)
    }

    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn type_meta(&self) -> TypeMeta {
        TypeMeta { api_version: self.gvk.api_version(), kind: self.gvk.kind.clone() }
    }
}

// Impl Deref lets a ResourceKind act like a GroupVersionKind anywhere one of those is expected
impl Deref for ResourceKind {
    type Target = GroupVersionKind;

    fn deref(&self) -> &Self::Target {
        &self.gvk
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.gvk.group.is_empty() {
            write!(f, "{}.{}", self.gvk.version, self.gvk.kind)
        } else {
            write!(f, "{}/{}.{}", self.gvk.group, self.gvk.version, self.gvk.kind)
        }
    }
}

lazy_static! {
    // core
    pub static ref NODE: ResourceKind = ResourceKind::new("", "v1", "Node", "nodes", false);
    pub static ref POD: ResourceKind = ResourceKind::new("", "v1", "Pod", "pods", true);
    pub static ref NAMESPACE: ResourceKind = ResourceKind::new("", "v1", "Namespace", "namespaces", false);
    pub static ref SERVICE: ResourceKind = ResourceKind::new("", "v1", "Service", "services", true);
    pub static ref COMPONENT_STATUS: ResourceKind =
        ResourceKind::new("", "v1", "ComponentStatus", "componentstatuses", false);
    pub static ref DEPLOYMENT: ResourceKind = ResourceKind::new("apps", "v1", "Deployment", "deployments", true);

    // openshift workloads
    pub static ref DEPLOYMENT_CONFIG: ResourceKind =
        ResourceKind::new("apps.openshift.io", "v1", "DeploymentConfig", "deploymentconfigs", true);
    pub static ref PROJECT: ResourceKind = ResourceKind::new("project.openshift.io", "v1", "Project", "projects", false);
    pub static ref PROJECT_REQUEST: ResourceKind =
        ResourceKind::new("project.openshift.io", "v1", "ProjectRequest", "projectrequests", false);
    pub static ref ROUTE: ResourceKind = ResourceKind::new("route.openshift.io", "v1", "Route", "routes", true);
    pub static ref TEMPLATE: ResourceKind =
        ResourceKind::new("template.openshift.io", "v1", "Template", "templates", true);
    pub static ref PROCESSED_TEMPLATE: ResourceKind =
        ResourceKind::new("template.openshift.io", "v1", "Template", "processedtemplates", true);
    pub static ref PIPELINE_RUN: ResourceKind =
        ResourceKind::new("tekton.dev", "v1beta1", "PipelineRun", "pipelineruns", true);

    // machine api
    pub static ref MACHINE_SET: ResourceKind =
        ResourceKind::new("machine.openshift.io", "v1beta1", "MachineSet", "machinesets", true);
    pub static ref MACHINE: ResourceKind =
        ResourceKind::new("machine.openshift.io", "v1beta1", "Machine", "machines", true);

    // cluster config and operators
    pub static ref CLUSTER_VERSION: ResourceKind =
        ResourceKind::new("config.openshift.io", "v1", "ClusterVersion", "clusterversions", false);
    pub static ref CLUSTER_OPERATOR: ResourceKind =
        ResourceKind::new("config.openshift.io", "v1", "ClusterOperator", "clusteroperators", false);
    pub static ref IMAGE_REGISTRY_CONFIG: ResourceKind =
        ResourceKind::new("imageregistry.operator.openshift.io", "v1", "Config", "configs", false);

    // operator lifecycle management
    pub static ref CATALOG_SOURCE: ResourceKind =
        ResourceKind::new("operators.coreos.com", "v1alpha1", "CatalogSource", "catalogsources", true);
    pub static ref SUBSCRIPTION: ResourceKind =
        ResourceKind::new("operators.coreos.com", "v1alpha1", "Subscription", "subscriptions", true);
    pub static ref CLUSTER_SERVICE_VERSION: ResourceKind =
        ResourceKind::new("operators.coreos.com", "v1alpha1", "ClusterServiceVersion", "clusterserviceversions", true);
    pub static ref PACKAGE_MANIFEST: ResourceKind =
        ResourceKind::new("packages.operators.coreos.com", "v1", "PackageManifest", "packagemanifests", true);

    static ref WELL_KNOWN_KINDS: Vec<&'static ResourceKind> = vec![
        &*NODE,
        &*POD,
        &*NAMESPACE,
        &*SERVICE,
        &*COMPONENT_STATUS,
        &*DEPLOYMENT,
        &*DEPLOYMENT_CONFIG,
        &*PROJECT,
        &*PROJECT_REQUEST,
        &*ROUTE,
        &*PIPELINE_RUN,
        &*MACHINE_SET,
        &*MACHINE,
        &*CLUSTER_VERSION,
        &*CLUSTER_OPERATOR,
        &*IMAGE_REGISTRY_CONFIG,
        &*CATALOG_SOURCE,
        &*SUBSCRIPTION,
        &*CLUSTER_SERVICE_VERSION,
        &*PACKAGE_MANIFEST,
    ];
}
