use assertables::*;

use super::*;
use crate::conditions::ConditionStatus;

#[rstest]
fn test_snapshot_from_dynamic_object() {
    let machine = test_machine("machine-a", TEST_MACHINE_SET, Some("Running"), Some(TEST_NODE));
    let snapshot = ResourceSnapshot::from(machine);

    assert_eq!(snapshot.name(), "machine-a");
    assert_eq!(snapshot.namespace(), Some(MACHINE_API_NS));
    assert_eq!(snapshot.phase(), Some("Running"));
    assert_eq!(snapshot.node_ref(), Some(TEST_NODE));
    assert_eq!(snapshot.labels(), klabel!(MACHINE_SET_LABEL_KEY => TEST_MACHINE_SET));
    assert_is_empty!(snapshot.conditions);

    let obj_ref = snapshot.to_ref();
    assert_eq!(obj_ref.kind, "Machine");
    assert_eq!(obj_ref.api_version, "machine.openshift.io/v1beta1");
}

#[rstest]
fn test_snapshot_numbers() {
    let snapshot = ResourceSnapshot::from(test_deployment(ROUTER_DEPLOYMENT, INGRESS_NS, 3, 2, 1));
    assert_eq!(snapshot.spec_i64("/replicas"), Some(3));
    assert_eq!(snapshot.status_i64("/availableReplicas"), Some(2));
    assert_eq!(snapshot.status_i64("/readyReplicas"), Some(1));
    assert_none!(snapshot.status_i64("/updatedReplicas"));
    assert_none!(snapshot.node_ref());
}

#[rstest]
fn test_snapshot_conditions() {
    let snapshot = ResourceSnapshot::from(test_deployment_config(TEST_DEPLOYMENT_CONFIG, TEST_NAMESPACE, "True", "False"));
    assert_eq!(snapshot.conditions, vec![
        Condition::new(AVAILABLE_CONDITION, ConditionStatus::True),
        Condition::new(PROGRESSING_CONDITION, ConditionStatus::False),
    ]);
}

#[rstest]
fn test_snapshot_component_status_conditions() {
    let snapshot = ResourceSnapshot::from(test_component_status("etcd-0", "True"));
    assert_len_eq_x!(&snapshot.conditions, 1);
    assert_eq!(snapshot.conditions[0].type_, HEALTHY_CONDITION);
    assert_eq!(snapshot.conditions[0].status, ConditionStatus::True);
}

#[rstest]
fn test_snapshot_no_status() {
    let obj = DynamicObject::new("foo", &NAMESPACE.api_resource());
    let snapshot = ResourceSnapshot::from(obj);
    assert_none!(snapshot.phase());
    assert_is_empty!(snapshot.conditions);
}
