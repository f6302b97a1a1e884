
use std::time::Duration;

use httpmock::Method::*;
use ocp_testutils::*;
use rstest::*;
use serde_json::{
    Value,
    json,
};
use tracing_test::traced_test;

use super::*;
