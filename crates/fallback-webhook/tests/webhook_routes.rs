//! Route-level tests: drive the axum router in-process against an
//! in-memory store and a pinned clock.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fallback_core::{
    EscalationMessages, FallbackController, FallbackStore, ManualClock, MemoryStore, StoreError,
    StoreResult, UserFallbackRecord,
};
use fallback_webhook::{build_router, AppState};
use serde_json::{json, Map, Value};
use tower::ServiceExt;

/// Store whose every call fails, as if the database were unreachable.
struct FailingStore;

#[async_trait]
impl FallbackStore for FailingStore {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, _user_id: &str) -> StoreResult<Option<UserFallbackRecord>> {
        Ok(None)
    }

    async fn update(&self, user_id: &str, _fields: Map<String, Value>) -> StoreResult<()> {
        Err(StoreError::Write {
            key: format!("users/{user_id}"),
            message: "connection reset".into(),
        })
    }
}

/// 2024-03-10 14:30 Asia/Bangkok, a Sunday.
fn sunday_afternoon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap()
}

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn at(now: DateTime<Utc>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(now));
        let controller = FallbackController::new(store.clone(), clock.clone());
        Self {
            app: build_router(AppState::new(controller)),
            store,
            clock,
        }
    }

    async fn post(&self, body: Value) -> (StatusCode, Value) {
        let request = Request::post("/webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(&self.app, request).await
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn fulfillment_request(intent: &str, user_id: Option<&str>) -> Value {
    let mut source = json!({"type": "user"});
    if let Some(id) = user_id {
        source["userId"] = json!(id);
    }
    json!({
        "responseId": "resp-1",
        "session": "projects/demo/agent/sessions/abc",
        "queryResult": {
            "queryText": "???",
            "languageCode": "th",
            "intent": {"displayName": intent}
        },
        "originalDetectIntentRequest": {
            "source": "line",
            "payload": {"data": {"source": source}}
        }
    })
}

fn text_of(body: &Value) -> &str {
    body["fulfillmentText"].as_str().unwrap()
}

#[tokio::test]
async fn test_status_route() {
    let harness = Harness::at(sunday_afternoon());
    let request = Request::get("/").body(Body::empty()).unwrap();

    let (status, body) = send(&harness.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "online");
    assert_eq!(body["service"], "Dialogflow Webhook");
    assert_eq!(body["firebase_status"], "initialized");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["timestamp"], "2024-03-10T07:30:00.000Z");
    assert_eq!(body["thai_time"], "10/3/2567 14:30:00");
}

#[tokio::test]
async fn test_first_fallback_in_hours_gets_short_reply() {
    let harness = Harness::at(sunday_afternoon());

    let (status, body) = harness
        .post(fulfillment_request("Default Fallback Intent", Some("U1")))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(text_of(&body), EscalationMessages::default().in_hours);
    assert_eq!(
        body["fulfillmentMessages"][0]["text"]["text"][0],
        json!(EscalationMessages::default().in_hours)
    );
    let record = harness.store.get("U1").await.unwrap().unwrap();
    assert_eq!(
        record.last_fallback_time,
        sunday_afternoon().timestamp_millis()
    );
}

#[tokio::test]
async fn test_after_hours_gets_long_reply() {
    let harness = Harness::at(sunday_afternoon() + Duration::minutes(330)); // 20:00 Bangkok

    let (_, body) = harness
        .post(fulfillment_request("Default Fallback Intent", Some("U1")))
        .await;

    assert_eq!(text_of(&body), EscalationMessages::default().after_hours);
}

#[tokio::test]
async fn test_cooldown_suppresses_then_expires() {
    let harness = Harness::at(sunday_afternoon());
    let request = fulfillment_request("Default Fallback Intent", Some("U1"));

    let (_, first) = harness.post(request.clone()).await;
    assert!(!text_of(&first).is_empty());
    let stored = harness.store.raw("U1").unwrap();

    harness.clock.advance(Duration::seconds(1));
    let (status, second) = harness.post(request.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text_of(&second), "");
    assert_eq!(harness.store.raw("U1").unwrap(), stored);

    harness.clock.advance(Duration::hours(5));
    let (_, third) = harness.post(request).await;
    assert!(!text_of(&third).is_empty());
}

#[tokio::test]
async fn test_requests_without_user_share_unknown_record() {
    let harness = Harness::at(sunday_afternoon());

    let (_, first) = harness
        .post(fulfillment_request("Default Fallback Intent", None))
        .await;
    let (_, second) = harness
        .post(json!({"queryResult": {"intent": {"displayName": "Default Fallback Intent"}}}))
        .await;

    assert!(!text_of(&first).is_empty());
    assert_eq!(text_of(&second), "");
    assert_eq!(harness.store.len(), 1);
    assert!(harness.store.raw("unknown").unwrap().is_some());
}

#[tokio::test]
async fn test_unhandled_intent_is_internal_error() {
    let harness = Harness::at(sunday_afternoon());

    let (status, body) = harness
        .post(fulfillment_request("Welcome Intent", Some("U1")))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_store_failure_returns_apology() {
    let controller = FallbackController::new(
        Arc::new(FailingStore),
        Arc::new(ManualClock::new(sunday_afternoon())),
    );
    let app = build_router(AppState::new(controller));
    let request = Request::post("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            fulfillment_request("Default Fallback Intent", Some("U1")).to_string(),
        ))
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(text_of(&body), EscalationMessages::default().apology);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let harness = Harness::at(sunday_afternoon());
    let request = Request::post("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _) = send(&harness.app, request).await;

    assert!(status.is_client_error());
    assert!(harness.store.is_empty());
}
