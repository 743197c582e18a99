use std::fmt;

use anyhow::Context;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use cucumber::{given, then, when, World as _};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use trips::{
    db::{init_pool, migrate},
    routes::create_router,
    services::sqlite::SqliteStore,
    state::AppState,
};

const EXAMPLE_TRIP: &str = r#"{
  "Name": "tripster",
  "Location": {
    "City": "Overland Park", "Place": "Running Trails", "State": "Kansas", "ContactInfo": "(913)401-9930"
  },
  "TimeFrame": {
    "StartTime": "9:30", "EndTime": "10:30"
  },
  "Members": [
    {"Name": "Cole", "IsComing": true, "Username": "LittleDog"},
    {"Name": "Max", "IsComing": true, "Username": "BigDawg"},
    {"Name": "Mahmood", "IsComing": false}
  ]
}"#;

#[derive(Debug, cucumber::World, Default)]
struct GatewayWorld {
    state: Option<TestState>,
    last_status: u16,
    last_body: String,
}

impl GatewayWorld {
    fn app(&self) -> Router {
        self.state
            .as_ref()
            .expect("gateway must be started first")
            .app
            .clone()
    }

    async fn send(&mut self, method: Method, uri: &str, body: &str) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let response = self.app().oneshot(request).await.expect("response");
        self.last_status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        self.last_body = String::from_utf8(bytes.to_vec()).expect("utf-8 body");
    }

    fn read_document(&self) -> Value {
        assert_eq!(self.last_status, 200, "read failed: {}", self.last_body);
        let (_, data) = self
            .last_body
            .split_once("Document Data: ")
            .expect("read response preamble");
        serde_json::from_str(data).expect("document JSON")
    }
}

struct TestState {
    app: Router,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let db_path = root.path().join("bdd.sqlite");
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let db = init_pool(&database_url).await?;
        migrate(&db).await?;

        let store = SqliteStore::new(db, "bdd-project");
        let app = create_router(AppState::new(store));
        Ok(Self { app, _root: root })
    }
}

#[given("a fresh trip gateway")]
async fn given_fresh_gateway(world: &mut GatewayWorld) {
    world.state = Some(TestState::new().await.expect("state"));
}

#[given(regex = r#"^the example trip was created at \"([^\"]+)\"$"#)]
async fn given_example_trip(world: &mut GatewayWorld, path: String) {
    world.send(Method::POST, &path, EXAMPLE_TRIP).await;
    assert_eq!(world.last_status, 200, "{}", world.last_body);
}

#[when(regex = r#"^I create the example trip at \"([^\"]+)\"$"#)]
async fn when_create_example(world: &mut GatewayWorld, path: String) {
    world.send(Method::POST, &path, EXAMPLE_TRIP).await;
}

#[when(regex = r#"^I send (GET|POST|PATCH|DELETE) \"([^\"]+)\"$"#)]
async fn when_send_empty(world: &mut GatewayWorld, method: String, path: String) {
    let method = Method::from_bytes(method.as_bytes()).expect("method");
    world.send(method, &path, "").await;
}

#[when(regex = r#"^I send (POST|PATCH) \"([^\"]+)\" with body '(.*)'$"#)]
async fn when_send_body(world: &mut GatewayWorld, method: String, path: String, body: String) {
    let method = Method::from_bytes(method.as_bytes()).expect("method");
    world.send(method, &path, &body).await;
}

#[then(regex = r"^the response status is (\d+)$")]
async fn then_status(world: &mut GatewayWorld, status: u16) {
    assert_eq!(world.last_status, status, "body: {}", world.last_body);
}

#[then(regex = r#"^the response ends with \"([^\"]+)\"$"#)]
async fn then_body_ends_with(world: &mut GatewayWorld, suffix: String) {
    assert!(
        world.last_body.ends_with(&suffix),
        "{:?} does not end with {suffix:?}",
        world.last_body
    );
}

#[then(regex = r#"^the trip field \"([^\"]+)\" is \"([^\"]*)\"$"#)]
async fn then_field_is(world: &mut GatewayWorld, pointer: String, expected: String) {
    let document = world.read_document();
    let value = document
        .pointer(&pointer)
        .unwrap_or_else(|| panic!("{pointer} missing from {document}"));
    assert_eq!(value, &Value::String(expected));
}

#[then(regex = r"^the trip has (\d+) members$")]
async fn then_member_count(world: &mut GatewayWorld, expected: usize) {
    let document = world.read_document();
    let members = document["members"].as_array().expect("members array");
    assert_eq!(members.len(), expected);
}

#[then(regex = r"^member (\d+) is not coming$")]
async fn then_member_not_coming(world: &mut GatewayWorld, position: usize) {
    let document = world.read_document();
    let member = &document["members"][position - 1];
    assert_ne!(member.get("isComing"), Some(&Value::Bool(true)));
}

#[tokio::main]
async fn main() {
    GatewayWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
