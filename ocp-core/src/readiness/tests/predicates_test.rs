use serde_json::json;

use super::*;
use crate::readiness::predicates::*;

fn snapshot(obj: DynamicObject) -> ResourceSnapshot {
    obj.into()
}

#[rstest]
#[case::ready_last(conditions(&[("DiskPressure", "False"), ("Ready", "True")]), true)]
#[case::ready_not_last(conditions(&[("Ready", "True"), ("DiskPressure", "False")]), false)]
#[case::not_ready(conditions(&[("DiskPressure", "False"), ("Ready", "Unknown")]), false)]
#[case::no_conditions(json!([]), false)]
fn test_node_ready(#[case] conds: Value, #[case] expected: bool) {
    assert_eq!(node_ready(&snapshot(test_node(TEST_NODE, conds))), expected);
}

#[rstest]
#[case::ready("True", true)]
#[case::not_ready("False", false)]
fn test_pod_ready(#[case] ready: &str, #[case] expected: bool) {
    assert_eq!(pod_ready(&snapshot(test_pod(TEST_POD, TEST_NAMESPACE, ready))), expected);
}

#[rstest]
#[case::both("True", "True", true)]
#[case::available_only("True", "False", false)]
#[case::progressing_only("False", "True", false)]
#[case::neither("False", "False", false)]
#[case::unknown("Unknown", "True", false)]
fn test_deployment_config_ready(#[case] available: &str, #[case] progressing: &str, #[case] expected: bool) {
    let dc = snapshot(test_deployment_config(TEST_DEPLOYMENT_CONFIG, TEST_NAMESPACE, available, progressing));
    assert_eq!(deployment_config_ready(&dc), expected);
}

#[rstest]
#[case::failed("False", "False", true)]
#[case::rolling_out("False", "True", false)]
#[case::unknown("Unknown", "False", false)]
fn test_deployment_config_failed(#[case] available: &str, #[case] progressing: &str, #[case] expected: bool) {
    let dc = snapshot(test_deployment_config(TEST_DEPLOYMENT_CONFIG, TEST_NAMESPACE, available, progressing));
    assert_eq!(deployment_config_failed(&dc), expected);
}

#[rstest]
fn test_pipeline_run_succeeded() {
    let run = named(&PIPELINE_RUN_AR, Some(TEST_NAMESPACE), TEST_PIPELINE_RUN, json!({"conditions": [
        {"type": "Succeeded", "status": "True", "reason": "Succeeded"},
    ]}));
    assert!(pipeline_run_succeeded(&snapshot(run)));

    let run = named(&PIPELINE_RUN_AR, Some(TEST_NAMESPACE), TEST_PIPELINE_RUN, json!({"conditions": [
        {"type": "Succeeded", "status": "Unknown", "reason": "Running"},
    ]}));
    assert!(!pipeline_run_succeeded(&snapshot(run)));
}

#[rstest]
#[case::matching(3, 3, 3, true)]
#[case::not_ready(3, 3, 2, false)]
#[case::scaled_to_zero(0, 0, 0, true)]
fn test_machine_set_replicas_match(
    #[case] spec: i64,
    #[case] replicas: i64,
    #[case] ready: i64,
    #[case] expected: bool,
) {
    let ms = snapshot(test_machine_set(TEST_MACHINE_SET, spec, replicas, ready));
    assert_eq!(machine_set_replicas_match(&ms), expected);
}

#[rstest]
fn test_machine_set_replicas_missing_ready_count() {
    let mut ms = snapshot(test_machine_set(TEST_MACHINE_SET, 0, 0, 0));
    ms.status = json!({"replicas": 0});
    assert!(machine_set_replicas_match(&ms));
    ms.status = json!({"replicas": 2});
    assert!(!machine_set_replicas_match(&ms));
}

#[rstest]
fn test_machine_set_replicas_are() {
    let ms = snapshot(test_machine_set(TEST_MACHINE_SET, 3, 5, 5));
    assert!(machine_set_replicas_are(5)(&ms));
    assert!(!machine_set_replicas_are(3)(&ms));
}

#[rstest]
fn test_machine_phase_is() {
    let machine = snapshot(test_machine("machine-a", TEST_MACHINE_SET, Some("Running"), Some(TEST_NODE)));
    assert!(machine_phase_is("Running")(&machine));
    assert!(!machine_phase_is("Deleting")(&machine));

    let provisioning = snapshot(test_machine("machine-b", TEST_MACHINE_SET, None, None));
    assert!(!machine_phase_is("Running")(&provisioning));
}

#[rstest]
fn test_project_phase_and_name() {
    let project = snapshot(test_project(TEST_NAMESPACE, "Active"));
    assert!(project_phase_is("Active")(&project));
    assert!(!project_phase_is("Terminating")(&project));
    assert!(name_is(TEST_NAMESPACE)(&project));
    assert!(!name_is("some-other-project")(&project));
}

#[rstest]
#[case::upgraded(
    json!([
        condition_at("Progressing", "False", "2024-05-01T10:00:00Z"),
        condition_at("Available", "True", "2024-05-01T11:00:00Z"),
    ]),
    TEST_OCP_VERSION,
    true
)]
#[case::still_progressing(
    json!([
        condition_at("Available", "True", "2024-05-01T10:00:00Z"),
        condition_at("Progressing", "True", "2024-05-01T11:00:00Z"),
    ]),
    TEST_OCP_VERSION,
    false
)]
#[case::wrong_version(
    json!([condition_at("Available", "True", "2024-05-01T11:00:00Z")]),
    "4.17.0",
    false
)]
fn test_cluster_version_upgraded(#[case] conds: Value, #[case] version: &str, #[case] expected: bool) {
    let cv = snapshot(test_cluster_version(TEST_OCP_VERSION, conds));
    assert_eq!(cluster_version_upgraded(version)(&cv), expected);
}
