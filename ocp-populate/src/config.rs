use std::collections::{
    BTreeMap,
    HashSet,
};
use std::fs;
use std::path::Path;

use ocp_core::errors::*;
use serde::Deserialize;
use serde_json::Value;

err_impl! {ConfigError,
    #[error("could not read population plan {0}")]
    Unreadable(String),

    #[error("malformed population plan: {0}")]
    Malformed(String),

    #[error("invalid population plan: {0}")]
    Invalid(String),
}

// What the plan author expects the cluster to look like before anything gets deployed; only the
// OCP version is actually checked, the rest is logged for the record
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Prerequisites {
    pub ocp_version: Option<String>,
    pub cns: bool,
    pub routers: Option<u32>,
    pub heketi: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AppDeploymentSpec {
    pub app_template: String,
    pub app_count: u32,
    pub app_replicas: i64,

    #[serde(default)]
    pub app_labels: BTreeMap<String, String>,

    // Template parameters can be written as plain YAML scalars (e.g., `MEMORY_LIMIT: 512Mi` or
    // `REPLICAS: 2`); they're all passed to the template as strings
    #[serde(default)]
    pub app_params: BTreeMap<String, Value>,
}

impl AppDeploymentSpec {
    pub fn param(&self, name: &str) -> Option<String> {
        self.app_params.get(name).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectDeploymentPlan {
    pub project_name: String,

    #[serde(default)]
    pub project_labels: BTreeMap<String, String>,

    #[serde(default)]
    pub apps: Vec<AppDeploymentSpec>,
}

impl ProjectDeploymentPlan {
    pub fn app_count(&self) -> usize {
        self.apps.iter().map(|app| app.app_count as usize).sum()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PopulationPlan {
    #[serde(default)]
    pub metadata: Prerequisites,
    pub projects: Vec<ProjectDeploymentPlan>,
}

impl PopulationPlan {
    pub fn load(path: &Path) -> anyhow::Result<PopulationPlan> {
        let contents = fs::read_to_string(path)
            .map_err(|err| anyhow::Error::from(err).context(ConfigError::Unreadable(path.display().to_string())))?;
        PopulationPlan::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<PopulationPlan> {
        let plan: PopulationPlan = serde_yaml::from_str(contents).map_err(|err| ConfigError::malformed(&err.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> EmptyResult {
        let mut seen = HashSet::new();
        for project in &self.projects {
            let name = &project.project_name;
            if name.is_empty() {
                bail!(ConfigError::Invalid("project_name must not be empty".into()));
            }
            if !seen.insert(name) {
                bail!(ConfigError::Invalid(format!("project {name} is listed more than once")));
            }

            for app in &project.apps {
                if app.app_template.is_empty() {
                    bail!(ConfigError::Invalid(format!("project {name} has an app with no template")));
                }
                if app.app_count == 0 {
                    bail!(ConfigError::Invalid(format!("app {} in project {name} has app_count 0", app.app_template)));
                }
                if app.app_replicas < 0 {
                    bail!(ConfigError::Invalid(format!(
                        "app {} in project {name} has negative app_replicas",
                        app.app_template
                    )));
                }
            }
        }
        Ok(())
    }
}
