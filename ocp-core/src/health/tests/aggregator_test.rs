use assertables::*;
use serde_json::Value;

use super::*;

const CONSOLE_ROUTE_PATH: &str = "/apis/route.openshift.io/v1/namespaces/openshift-console/routes/console";
const REGISTRY_CONFIG_PATH: &str = "/apis/imageregistry.operator.openshift.io/v1/configs/cluster";

fn serve(fake_apiserver: &mut MockServerBuilder, path: &str, body: Value) {
    let path = path.to_string();
    fake_apiserver.handle(move |when, then| {
        when.method(GET).path(&path);
        then.json_body(body.clone());
    });
}

fn to_json(obj: &DynamicObject) -> Value {
    serde_json::to_value(obj).unwrap()
}

// Everything but the web console, which needs a real TLS endpoint
fn serve_healthy_cluster(fake_apiserver: &mut MockServerBuilder) {
    serve(
        fake_apiserver,
        "/api/v1/nodes",
        list_of(&NODE_AR, vec![ready_node("worker-1"), ready_node("worker-2")]),
    );
    serve(
        fake_apiserver,
        &format!("/api/v1/namespaces/{INGRESS_NS}/pods"),
        list_of(
            &POD_AR,
            vec![
                test_pod("router-default-6d5f-abcde", INGRESS_NS, "True"),
                test_pod("router-default-6d5f-fghij", INGRESS_NS, "True"),
            ],
        ),
    );
    serve(
        fake_apiserver,
        &format!("/apis/apps/v1/namespaces/{INGRESS_NS}/deployments/{ROUTER_DEPLOYMENT}"),
        to_json(&test_deployment(ROUTER_DEPLOYMENT, INGRESS_NS, 2, 2, 2)),
    );
    serve(
        fake_apiserver,
        &format!("/api/v1/namespaces/{IMAGE_REGISTRY_NS}/pods"),
        list_of(&POD_AR, vec![test_pod("image-registry-7d9f8c-abcde", IMAGE_REGISTRY_NS, "True")]),
    );
    for name in [IMAGE_REGISTRY_DEPLOYMENT, IMAGE_REGISTRY_OPERATOR_DEPLOYMENT] {
        serve(
            fake_apiserver,
            &format!("/apis/apps/v1/namespaces/{IMAGE_REGISTRY_NS}/deployments/{name}"),
            to_json(&test_deployment(name, IMAGE_REGISTRY_NS, 1, 1, 1)),
        );
    }
    serve(
        fake_apiserver,
        REGISTRY_CONFIG_PATH,
        to_json(&test_registry_config("Managed", json!({"pvc": {"claim": "image-registry-storage"}}))),
    );
    fake_apiserver.handle(|when, then| {
        when.method(GET).path("/healthz");
        then.body("ok");
    });
    serve(
        fake_apiserver,
        "/apis/config.openshift.io/v1/clusterversions/version",
        to_json(&test_cluster_version(TEST_OCP_VERSION, conditions(&[("Available", "True")]))),
    );
    serve(
        fake_apiserver,
        "/api/v1/componentstatuses",
        list_of(
            &COMPONENT_STATUS_AR,
            vec![test_component_status("scheduler", "True"), test_component_status("etcd-0", "True")],
        ),
    );
    serve(
        fake_apiserver,
        "/apis/config.openshift.io/v1/clusteroperators",
        list_of(
            &CLUSTER_OPERATOR_AR,
            vec![test_cluster_operator("console", "True"), test_cluster_operator("dns", "True")],
        ),
    );
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_check_cluster_health_console_unreachable() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    serve_healthy_cluster(&mut fake_apiserver);
    fake_apiserver.handle_not_found(CONSOLE_ROUTE_PATH.into());

    let aggregator = HealthAggregator::new(ResourceClient::new(client)).unwrap();
    let health = aggregator.check_cluster_health().await;
    fake_apiserver.assert();

    assert!(!health.healthy);
    assert!(health.persistent_storage);
    assert_len_eq_x!(&health.reports, 8);
    assert_eq!(health.unhealthy_components(), vec![WEB_CONSOLE_COMPONENT]);

    let console = health.reports.iter().find(|r| r.component() == WEB_CONSOLE_COMPONENT).unwrap();
    assert_contains!(console.detail()["error"].as_str().unwrap(), "not found");
    assert!(logs_contain("could not check web_console health"));
    assert!(logs_contain("cluster is unhealthy: web_console"));
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_check_cluster_health_serializes() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    serve_healthy_cluster(&mut fake_apiserver);
    fake_apiserver.handle_not_found(CONSOLE_ROUTE_PATH.into());

    let aggregator = HealthAggregator::new(ResourceClient::new(client)).unwrap();
    let health = serde_json::to_value(aggregator.check_cluster_health().await).unwrap();
    fake_apiserver.assert();

    assert_eq!(health["healthy"], json!(false));
    assert_eq!(health["reports"][0], json!({"component": "nodes", "healthy": true, "detail": {}}));
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_check_registry_storage_missing_config() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver.handle_not_found(REGISTRY_CONFIG_PATH.into());

    let aggregator = HealthAggregator::new(ResourceClient::new(client)).unwrap();
    assert!(!aggregator.check_registry_storage().await);
    fake_apiserver.assert();
    assert!(logs_contain("could not read image registry config"));
}

#[rstest]
#[tokio::test]
async fn test_check_web_console_no_host() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let route = json!({
        "apiVersion": "route.openshift.io/v1",
        "kind": "Route",
        "metadata": {"name": CONSOLE_ROUTE_NAME, "namespace": CONSOLE_NS},
        "spec": {"to": {"kind": "Service", "name": "console"}},
    });
    serve(&mut fake_apiserver, CONSOLE_ROUTE_PATH, route);

    let aggregator = HealthAggregator::new(ResourceClient::new(client)).unwrap();
    let err = aggregator.check_web_console_health().await.unwrap_err();
    fake_apiserver.assert();
    assert_contains!(format!("{err}"), "has no host");
}

#[rstest]
#[tokio::test]
async fn test_probe_url_with_token() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver.handle(|when, then| {
        when.method(GET).path("/healthz").header("authorization", "Bearer sha256~abc123");
        then.body("ok");
    });
    fake_apiserver.handle(|when, then| {
        when.method(GET).path("/broken");
        then.status(500).body("boom");
    });

    let aggregator = HealthAggregator::new(ResourceClient::new(client))
        .unwrap()
        .with_console_token(Some("sha256~abc123".into()));
    assert_eq!(aggregator.probe_url(&fake_apiserver.url_for("/healthz")).await.unwrap(), "ok");
    assert_err!(aggregator.probe_url(&fake_apiserver.url_for("/broken")).await);
    fake_apiserver.assert();
}
