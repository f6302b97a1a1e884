mod predicates_test;

use std::time::Duration;

use httpmock::Method::*;
use ocp_testutils::*;
use rstest::*;
use serde_json::Value;
use tracing_test::traced_test;

use super::*;

fn to_json(obj: &DynamicObject) -> Value {
    serde_json::to_value(obj).unwrap()
}

fn make_poller(client: kube::Client) -> ReadinessPoller {
    ReadinessPoller::new(ResourceClient::new(client))
}
