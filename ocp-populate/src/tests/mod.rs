mod config_test;

use httpmock::Method::*;
use ocp_testutils::*;
use rstest::*;
use serde_json::{
    Value,
    json,
};
use tracing_test::traced_test;

use super::*;
use crate::config::*;

const TEST_TEMPLATE: &str = "django-psql-persistent";
const TEST_APP: &str = "django";

const TEST_PLAN: &str = "
---
metadata:
  ocp_version: '4.16'
  cns: false
  routers: 2
projects:
  - project_name: test-project
    project_labels:
      purpose: longevity
    apps:
      - app_template: django-psql-persistent
        app_count: 1
        app_replicas: 2
        app_labels:
          app: django
        app_params:
          NAME: django
          MEMORY_LIMIT: 512Mi
  - project_name: skip-me
    apps:
      - app_template: django-psql-persistent
        app_count: 3
        app_replicas: 1
";

#[fixture]
fn test_plan() -> PopulationPlan {
    PopulationPlan::from_yaml(TEST_PLAN).unwrap()
}

#[fixture]
fn test_app() -> AppDeploymentSpec {
    test_plan().projects[0].apps[0].clone()
}

fn test_template() -> Value {
    json!({
        "apiVersion": "template.openshift.io/v1",
        "kind": "Template",
        "metadata": {"name": TEST_TEMPLATE, "namespace": "openshift", "resourceVersion": "1234"},
        "parameters": [
            {"name": "NAME", "value": "django-psql-persistent", "required": true},
            {"name": "MEMORY_LIMIT", "value": "256Mi"},
            {"name": "DATABASE_SERVICE_NAME", "value": "postgresql"},
        ],
        "objects": [],
    })
}

fn processed_template(name: &str) -> Value {
    json!({
        "apiVersion": "template.openshift.io/v1",
        "kind": "Template",
        "metadata": {"name": TEST_TEMPLATE},
        "objects": [
            {
                "apiVersion": "v1",
                "kind": "Service",
                "metadata": {"name": name},
                "spec": {"ports": [{"name": "web", "port": 8080}]},
            },
            {
                "apiVersion": "apps.openshift.io/v1",
                "kind": "DeploymentConfig",
                "metadata": {"name": name},
                "spec": {"replicas": 1},
            },
        ],
    })
}

fn to_json(obj: &DynamicObject) -> Value {
    serde_json::to_value(obj).unwrap()
}

fn dc_path(ns: &str) -> String {
    format!("/apis/apps.openshift.io/v1/namespaces/{ns}/deploymentconfigs")
}

// Template lookup, processing, and creation of the processed objects for one copy of TEST_APP
fn expect_app_objects(fake_apiserver: &mut MockServerBuilder, ns: &str) {
    let dc_name = format!("{TEST_APP}-0");
    fake_apiserver.handle(|when, then| {
        when.method(GET)
            .path(format!("/apis/template.openshift.io/v1/namespaces/openshift/templates/{TEST_TEMPLATE}"));
        then.json_body(test_template());
    });

    let path = format!("/apis/template.openshift.io/v1/namespaces/{ns}/processedtemplates");
    let processed = processed_template(&dc_name);
    let name = dc_name.clone();
    fake_apiserver.handle(move |when, then| {
        when.method(POST).path(&path).body_matches(name.as_str());
        then.json_body(processed.clone());
    });

    let path = format!("/api/v1/namespaces/{ns}/services");
    let service = processed_template(&dc_name)["objects"][0].clone();
    fake_apiserver.handle(move |when, then| {
        when.method(POST).path(&path);
        then.json_body(service.clone());
    });

    let path = dc_path(ns);
    let dc = to_json(&test_deployment_config(&dc_name, ns, "False", "True"));
    fake_apiserver.handle(move |when, then| {
        when.method(POST).path(&path);
        then.json_body(dc.clone());
    });
}
