// Well-known namespaces
pub const INGRESS_NS: &str = "openshift-ingress";
pub const IMAGE_REGISTRY_NS: &str = "openshift-image-registry";
pub const CONSOLE_NS: &str = "openshift-console";
pub const MACHINE_API_NS: &str = "openshift-machine-api";
pub const MARKETPLACE_NS: &str = "openshift-marketplace";
pub const TEMPLATE_NS: &str = "openshift";

// Well-known object names
pub const ROUTER_DEPLOYMENT: &str = "router-default";
pub const IMAGE_REGISTRY_DEPLOYMENT: &str = "image-registry";
pub const IMAGE_REGISTRY_OPERATOR_DEPLOYMENT: &str = "cluster-image-registry-operator";
pub const IMAGE_REGISTRY_CONFIG_NAME: &str = "cluster";
pub const CLUSTER_VERSION_NAME: &str = "version";
pub const CONSOLE_ROUTE_NAME: &str = "console";

// Well-known labels
pub const MACHINE_SET_LABEL_KEY: &str = "machine.openshift.io/cluster-api-machineset";
pub const ROUTER_POD_LABEL_SELECTOR: &str = "ingresscontroller.operator.openshift.io/deployment-ingresscontroller=default";
pub const DEPLOYMENT_CONFIG_LABEL_KEY: &str = "openshift.io/deployment-config.name";
pub const POPULATED_LABEL_KEY: &str = "ocp-harness.io/populated";

// Condition types
pub const READY_CONDITION: &str = "Ready";
pub const AVAILABLE_CONDITION: &str = "Available";
pub const PROGRESSING_CONDITION: &str = "Progressing";
pub const SUCCEEDED_CONDITION: &str = "Succeeded";
pub const HEALTHY_CONDITION: &str = "Healthy";
pub const NODE_PRESSURE_CONDITIONS: [&str; 3] = ["DiskPressure", "MemoryPressure", "PIDPressure"];

// Env vars
pub const KUBECONFIG_ENV_VAR: &str = "KUBECONFIG";
pub const CLUSTER_CONF_ENV_VAR: &str = "PIQE_OCP_LIB_CLUSTER_CONF";
pub const POLLING_INTERVAL_ENV_VAR: &str = "CLUSTER_POLLING_SECONDS_INTERVAL";
pub const CONSOLE_TOKEN_ENV_VAR: &str = "OCP_CONSOLE_TOKEN";

// Timing
pub const DEFAULT_WATCH_TIMEOUT_SECONDS: u64 = 60;
pub const NODE_READY_TIMEOUT_SECONDS: u64 = 600;
pub const MACHINE_RUNNING_TIMEOUT_SECONDS: u64 = 900;
pub const MACHINE_DELETE_TIMEOUT_SECONDS: u64 = 900;
pub const NODE_DELETE_TIMEOUT_SECONDS: u64 = 600;
pub const PROJECT_TIMEOUT_SECONDS: u64 = 120;
pub const DEPLOYMENT_CONFIG_TIMEOUT_SECONDS: u64 = 1200;
pub const PACKAGE_MANIFEST_POLL_SECONDS: i64 = 5;
pub const DEFAULT_POLLING_INTERVAL_SECONDS: i64 = 60;

// The apiserver refuses watches with timeoutSeconds >= 295, so longer budgets are split up
pub const MAX_WATCH_WINDOW_SECONDS: u64 = 290;
pub const WATCH_WINDOW_SLACK_SECONDS: u64 = 1;
