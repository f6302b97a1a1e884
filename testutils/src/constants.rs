use kube::api::GroupVersionKind;
use kube::discovery::ApiResource;
use lazy_static::lazy_static;

pub const TEST_NAMESPACE: &str = "test-project";
pub const TEST_MACHINE_NAMESPACE: &str = "openshift-machine-api";
pub const TEST_NODE: &str = "worker-1";
pub const TEST_POD: &str = "test-pod";
pub const TEST_DEPLOYMENT: &str = "the-deployment";
pub const TEST_DEPLOYMENT_CONFIG: &str = "test-app-0";
pub const TEST_MACHINE_SET: &str = "ocp-worker-us-east-1a";
pub const TEST_PIPELINE_RUN: &str = "test-pipeline-run";
pub const TEST_OCP_VERSION: &str = "4.16.3";

lazy_static! {
    pub static ref NODE_AR: ApiResource = ar("", "v1", "Node", "nodes");
    pub static ref POD_AR: ApiResource = ar("", "v1", "Pod", "pods");
    pub static ref COMPONENT_STATUS_AR: ApiResource = ar("", "v1", "ComponentStatus", "componentstatuses");
    pub static ref DEPLOYMENT_AR: ApiResource = ar("apps", "v1", "Deployment", "deployments");
    pub static ref DEPLOYMENT_CONFIG_AR: ApiResource =
        ar("apps.openshift.io", "v1", "DeploymentConfig", "deploymentconfigs");
    pub static ref PROJECT_AR: ApiResource = ar("project.openshift.io", "v1", "Project", "projects");
    pub static ref PIPELINE_RUN_AR: ApiResource = ar("tekton.dev", "v1beta1", "PipelineRun", "pipelineruns");
    pub static ref MACHINE_SET_AR: ApiResource = ar("machine.openshift.io", "v1beta1", "MachineSet", "machinesets");
    pub static ref MACHINE_AR: ApiResource = ar("machine.openshift.io", "v1beta1", "Machine", "machines");
    pub static ref CLUSTER_VERSION_AR: ApiResource =
        ar("config.openshift.io", "v1", "ClusterVersion", "clusterversions");
    pub static ref CLUSTER_OPERATOR_AR: ApiResource =
        ar("config.openshift.io", "v1", "ClusterOperator", "clusteroperators");
    pub static ref REGISTRY_CONFIG_AR: ApiResource =
        ar("imageregistry.operator.openshift.io", "v1", "Config", "configs");
    pub static ref CATALOG_SOURCE_AR: ApiResource =
        ar("operators.coreos.com", "v1alpha1", "CatalogSource", "catalogsources");
}

fn ar(group: &str, version: &str, kind: &str, plural: &str) -> ApiResource {
    ApiResource::from_gvk_with_plural(&GroupVersionKind::gvk(group, version, kind), plural)
}
