use assert_fs::prelude::*;
use assertables::*;

use super::*;

fn config_error(err: &anyhow::Error) -> &ConfigError {
    err.downcast_ref::<ConfigError>().unwrap()
}

#[rstest]
fn test_load_plan(test_plan: PopulationPlan) {
    assert_eq!(
        test_plan.metadata,
        Prerequisites { ocp_version: Some("4.16".into()), cns: false, routers: Some(2), heketi: false }
    );
    let names: Vec<_> = test_plan.projects.iter().map(|p| p.project_name.as_str()).collect();
    assert_eq!(names, vec!["test-project", "skip-me"]);

    let project = &test_plan.projects[0];
    assert_eq!(project.project_labels["purpose"], "longevity");
    assert_eq!(project.app_count(), 1);
    assert_eq!(test_plan.projects[1].app_count(), 3);
    assert_is_empty!(test_plan.projects[1].project_labels);
}

#[rstest]
fn test_load_plan_from_file() {
    let file = assert_fs::NamedTempFile::new("plan.yml").unwrap();
    file.write_str(TEST_PLAN).unwrap();

    let plan = PopulationPlan::load(file.path()).unwrap();
    assert_len_eq_x!(&plan.projects, 2);
}

#[rstest]
fn test_load_plan_unreadable() {
    let dir = assert_fs::TempDir::new().unwrap();
    let err = PopulationPlan::load(&dir.path().join("missing.yml")).unwrap_err();
    assert!(matches!(config_error(&err), ConfigError::Unreadable(_)));
}

#[rstest]
fn test_app_params_as_strings() {
    let app: AppDeploymentSpec = serde_yaml::from_str(
        "
app_template: nginx-example
app_count: 1
app_replicas: 1
app_params:
  NAME: nginx
  REPLICAS: 2
  DEBUG: true
",
    )
    .unwrap();

    assert_eq!(app.param("NAME").as_deref(), Some("nginx"));
    assert_eq!(app.param("REPLICAS").as_deref(), Some("2"));
    assert_eq!(app.param("DEBUG").as_deref(), Some("true"));
    assert_none!(app.param("MEMORY_LIMIT"));
}

#[rstest]
#[case::unknown_field("projects: []\nextra: 1\n")]
#[case::missing_projects("metadata:\n  ocp_version: '4.16'\n")]
#[case::missing_template("projects:\n  - project_name: foo\n    apps:\n      - app_count: 1\n        app_replicas: 1\n")]
#[case::not_yaml("projects: [\n")]
fn test_malformed_plan(#[case] contents: &str) {
    let err = PopulationPlan::from_yaml(contents).unwrap_err();
    assert!(matches!(config_error(&err), ConfigError::Malformed(_)));
}

#[rstest]
#[case::empty_name("projects:\n  - project_name: ''\n", "must not be empty")]
#[case::duplicate("projects:\n  - project_name: foo\n  - project_name: foo\n", "more than once")]
#[case::zero_count(
    "projects:\n  - project_name: foo\n    apps:\n      - app_template: t\n        app_count: 0\n        app_replicas: 1\n",
    "app_count 0"
)]
#[case::negative_replicas(
    "projects:\n  - project_name: foo\n    apps:\n      - app_template: t\n        app_count: 1\n        app_replicas: -1\n",
    "negative app_replicas"
)]
fn test_invalid_plan(#[case] contents: &str, #[case] message: &str) {
    let err = PopulationPlan::from_yaml(contents).unwrap_err();
    assert!(matches!(config_error(&err), ConfigError::Invalid(_)));
    assert_contains!(format!("{err}"), message);
}
