use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use tower::ServiceExt;

use profile_autopilot::{
    create_router,
    services::{Profile, SimulatedProfileService},
    state::{AppState, Settings},
    store::{MemoryBackend, StoreBackend},
    tasks::spawn_background,
    Error,
};

struct Harness {
    app: Router,
    state: Arc<AppState>,
    service: Arc<SimulatedProfileService>,
}

/// Reads work, writes always fail
struct ReadOnlyBackend;

#[async_trait]
impl StoreBackend for ReadOnlyBackend {
    async fn load(&self, _list: &str) -> profile_autopilot::Result<Vec<Value>> {
        Ok(Vec::new())
    }

    async fn save(&self, list: &str, _entries: &[Value]) -> profile_autopilot::Result<()> {
        Err(Error::Store(format!("{} is read-only", list)))
    }
}

async fn harness() -> Harness {
    harness_with(Arc::new(MemoryBackend::new())).await
}

async fn harness_with(backend: Arc<dyn StoreBackend>) -> Harness {
    let service = Arc::new(SimulatedProfileService::new(Profile::new("Base")));
    let settings = Settings {
        extend_step: Duration::from_secs(10),
        tick: Duration::from_millis(20),
    };
    let (state, expired_rx) =
        AppState::bootstrap(service.clone(), backend, settings)
            .await
            .unwrap();
    spawn_background(&state, expired_rx);

    Harness {
        app: create_router(Arc::clone(&state)),
        state,
        service,
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn wait_for_rendered(app: &Router, count: usize) -> Value {
    for _ in 0..200 {
        let (_, body) = send(app, Method::GET, "/activities", None).await;
        if body["activities"].as_array().map(Vec::len) == Some(count) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("activity list never reached {} items", count);
}

#[tokio::test]
async fn untimed_group_join_stays_until_finished() {
    let h = harness().await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/group-join",
        Some(json!({ "url": "steamcommunity.com/groups/foxes?l=english", "time": 0, "save": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activity"]["group_name"], "foxes");
    assert_eq!(body["activity"]["counting"], false);
    assert_eq!(body["template_index"], 0);
    let id = body["activity"]["id"].as_u64().unwrap();

    let listed = wait_for_rendered(&h.app, 1).await;
    assert_eq!(listed["has_active_items"], true);
    assert_eq!(listed["activities"][0]["time"]["mode"], "static");

    let (status, body) = send(&h.app, Method::POST, &format!("/activities/{}/finish", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_active_items"], false);
    assert_eq!(body["activities"].as_array().unwrap().len(), 0);

    // Untimed joins are not reverted.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.service.groups().len(), 1);

    let (status, _) = send(&h.app, Method::POST, &format!("/activities/{}/finish", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_time_is_rejected_and_control_released() {
    let h = harness().await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/group-join",
        Some(json!({ "url": "steamcommunity.com/groups/foxes", "time": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");
    assert!(!h.state.group_control.is_busy());
    assert!(h.state.registry.is_empty());

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/group-join",
        Some(json!({ "url": "steamcommunity.com/groups/foxes", "time": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn timed_rename_extends_and_reverts_on_finish() {
    let h = harness().await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/name-change",
        Some(json!({ "name": "Base [away]", "time": 30, "plus": true, "save": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["activity"]["id"].as_u64().unwrap();
    assert_eq!(h.service.profile().persona_name, "Base [away]");

    wait_for_rendered(&h.app, 1).await;

    let (status, body) = send(&h.app, Method::POST, &format!("/activities/{}/extend", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["activity"]["seconds"].as_u64().unwrap() > 30);

    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/activities/{}/extend", id),
        Some(json!({ "seconds": 60 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["activity"]["seconds"].as_u64().unwrap() > 90);

    let (status, _) = send(&h.app, Method::POST, &format!("/activities/{}/finish", id), None).await;
    assert_eq!(status, StatusCode::OK);

    for _ in 0..200 {
        if h.service.profile().persona_name == "Base" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.service.profile().persona_name, "Base");

    let (_, profile) = send(&h.app, Method::GET, "/profile", None).await;
    assert_eq!(profile["display_name"], "Base");
    assert_eq!(profile["has_active_items"], false);
    assert_eq!(profile["last_action"], "finish");
}

#[tokio::test]
async fn timed_join_renders_as_counting() {
    let h = harness().await;
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/group-join",
        Some(json!({ "url": "steamcommunity.com/groups/foxes", "time": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["activity"]["id"].as_u64().unwrap();

    let listed = wait_for_rendered(&h.app, 1).await;
    assert_eq!(listed["activities"][0]["id"].as_u64(), Some(id));
    assert_eq!(listed["activities"][0]["time"]["mode"], "counting");
}

#[tokio::test]
async fn template_save_recall_remove() {
    let h = harness().await;

    send(
        &h.app,
        Method::POST,
        "/name-change",
        Some(json!({ "name": "Base [away]", "time": 0, "plus": true, "save": true })),
    )
    .await;
    send(
        &h.app,
        Method::POST,
        "/name-change",
        Some(json!({ "name": "Fox", "time": 30, "plus": false, "save": true })),
    )
    .await;

    let (status, body) = send(&h.app, Method::GET, "/templates/name", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["templates"],
        json!([
            { "name": "[away]", "time": 0, "plus": true },
            { "name": "Fox", "time": 30, "plus": false }
        ])
    );

    let (status, body) = send(&h.app, Method::GET, "/templates/name/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["field_value"], "Base [away] [away]");
    assert_eq!(body["has_time"], false);

    let (status, _) = send(
        &h.app,
        Method::DELETE,
        "/templates/name/0",
        Some(json!({ "expected": { "name": "Fox", "time": 30, "plus": false } })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&h.app, Method::DELETE, "/templates/name/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["templates"], json!([{ "name": "Fox", "time": 30, "plus": false }]));

    let (status, _) = send(&h.app, Method::GET, "/templates/name/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&h.app, Method::GET, "/templates/group", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["templates"], json!([]));
}

#[tokio::test]
async fn unknown_activity_cannot_be_extended() {
    let h = harness().await;
    let (status, body) = send(&h.app, Method::POST, "/activities/4242/extend", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn oversized_times_are_rejected_without_side_effects() {
    let h = harness().await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/group-join",
        Some(json!({ "url": "steamcommunity.com/groups/foxes", "time": u64::MAX })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");
    assert!(h.service.groups().is_empty());
    assert!(h.state.registry.is_empty());
    assert!(!h.state.group_control.is_busy());

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/group-join",
        Some(json!({ "url": "steamcommunity.com/groups/foxes", "time": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["activity"]["id"].as_u64().unwrap();

    let (status, _) = send(
        &h.app,
        Method::POST,
        &format!("/activities/{}/extend", id),
        Some(json!({ "seconds": u64::MAX })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // The server is still serving and the activity is untouched.
    let (status, body) = send(&h.app, Method::POST, &format!("/activities/{}/extend", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["activity"]["seconds"].as_u64().unwrap() <= 40);
}

#[tokio::test]
async fn failed_template_save_still_reports_started_operation() {
    let h = harness_with(Arc::new(ReadOnlyBackend)).await;

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/group-join",
        Some(json!({ "url": "steamcommunity.com/groups/foxes", "time": 30, "save": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "started");
    assert_eq!(body["template_index"], Value::Null);
    assert!(body["warning"].as_str().unwrap().contains("read-only"));
    assert_eq!(h.service.groups().len(), 1);
    assert_eq!(h.state.registry.len(), 1);
    assert!(!h.state.group_control.is_busy());

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/name-change",
        Some(json!({ "name": "Fox", "time": 0, "save": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["warning"].is_string());
    assert_eq!(h.service.profile().persona_name, "Fox");

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/group-join",
        Some(json!({ "url": "steamcommunity.com/groups/wolves", "time": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("warning").is_none());
}
