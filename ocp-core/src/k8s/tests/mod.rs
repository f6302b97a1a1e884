mod snapshot_test;

use httpmock::Method::*;
use ocp_testutils::*;
use rstest::*;
use serde_json::json;
use tracing_test::traced_test;

use super::*;
use crate::macros::*;
use crate::prelude::*;
