mod aggregator_test;

use httpmock::Method::*;
use ocp_testutils::*;
use rstest::*;
use serde_json::json;
use tracing_test::traced_test;

use super::*;

fn snapshots(objs: Vec<DynamicObject>) -> Vec<ResourceSnapshot> {
    objs.into_iter().map(ResourceSnapshot::from).collect()
}
