use std::collections::BTreeMap;
use std::sync::{
    Arc,
    Mutex,
};

use httpmock::prelude::*;
use httpmock::{
    Mock,
    Then,
    When,
};
use serde_json::{
    Value,
    json,
};

// Mocks are registered with the server as soon as they're handed in; when more than one mock
// matches a request, the one registered first wins, so more specific handlers (e.g., watches) need
// to be set up before less specific ones on the same path.
#[derive(Clone)]
pub struct MockServerBuilder {
    server: Arc<MockServer>,
    expected_hits: Arc<Mutex<BTreeMap<usize, usize>>>,
}

impl MockServerBuilder {
    pub fn new() -> MockServerBuilder {
        MockServerBuilder {
            server: Arc::new(MockServer::start()),
            expected_hits: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn assert(&self) {
        for (id, hits) in self.expected_hits.lock().unwrap().iter() {
            println!("checking assertions for mock {id}");
            Mock::new(*id, &self.server).assert_hits(*hits);
        }
    }

    pub fn hits(&self, id: usize) -> usize {
        Mock::new(id, &self.server).hits()
    }

    pub fn handle<F: Fn(When, Then) + 'static>(&mut self, f: F) -> usize {
        self.handle_multiple(1, f)
    }

    pub fn handle_multiple<F: Fn(When, Then) + 'static>(&mut self, hits: usize, f: F) -> usize {
        let id = self.register(f);
        self.expected_hits.lock().unwrap().insert(id, hits);
        id
    }

    // No hit count is checked for these; useful for lookups whose number depends on timing
    pub fn handle_any<F: Fn(When, Then) + 'static>(&mut self, f: F) -> usize {
        self.register(f)
    }

    pub fn handle_not_found(&mut self, path: String) -> usize {
        self.handle(move |when, then| {
            when.method(GET).path(&path);
            then.status(404).json_body(status_not_found());
        })
    }

    pub fn handle_status(&mut self, method: Method, path: String, status: Value) -> usize {
        let code = status["code"].as_u64().unwrap_or(500) as u16;
        let method = method.to_string();
        self.handle(move |when, then| {
            when.method(method.as_str()).path(&path);
            then.status(code).json_body(status.clone());
        })
    }

    // Serve a watch request on the given path; the stream ends once all the events are sent
    pub fn handle_watch(&mut self, path: String, events: Vec<(&str, Value)>) -> usize {
        let body = watch_body(&events);
        self.handle(move |when, then| {
            when.method(GET).path(&path).query_param("watch", "true");
            then.header("content-type", "application/json").body(&body);
        })
    }

    pub fn drop(&mut self, id: usize) {
        self.expected_hits.lock().unwrap().remove(&id);
        Mock::new(id, &self.server).delete();
    }

    pub fn url(&self) -> http::Uri {
        http::Uri::try_from(self.server.url("/")).unwrap()
    }

    pub fn url_for(&self, path: &str) -> String {
        self.server.url(path)
    }

    fn register<F: Fn(When, Then) + 'static>(&mut self, f: F) -> usize {
        self.server.mock(f).id
    }
}

impl Default for MockServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn make_fake_apiserver() -> (MockServerBuilder, kube::Client) {
    let builder = MockServerBuilder::new();
    let config = kube::Config::new(builder.url());
    let client = kube::Client::try_from(config).unwrap();
    (builder, client)
}

// The apiserver streams watch events as newline-delimited JSON objects
pub fn watch_body(events: &[(&str, Value)]) -> String {
    events
        .iter()
        .map(|(type_, obj)| json!({"type": type_, "object": obj}).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn watch_error(code: u16, message: &str) -> (&'static str, Value) {
    (
        "ERROR",
        json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": message,
            "reason": "Expired",
            "code": code,
        }),
    )
}

pub fn status_ok() -> Value {
    json!({
      "kind": "Status",
      "apiVersion": "v1",
      "metadata": {},
      "status": "Success",
      "code": 200
    })
}

fn status_failure(reason: &str, code: u16) -> Value {
    json!({
      "kind": "Status",
      "apiVersion": "v1",
      "metadata": {},
      "status": "Failure",
      "message": format!("request failed: {reason}"),
      "reason": reason,
      "code": code
    })
}

pub fn status_not_found() -> Value {
    status_failure("NotFound", 404)
}

pub fn status_conflict() -> Value {
    status_failure("AlreadyExists", 409)
}

pub fn status_unprocessable() -> Value {
    status_failure("Invalid", 422)
}

pub fn status_internal_error() -> Value {
    status_failure("InternalError", 500)
}
