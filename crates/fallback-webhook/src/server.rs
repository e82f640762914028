//! HTTP surface: status route, fulfillment route, startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use fallback_core::{
    BusinessHours, CooldownConfig, FallbackController, FirebaseStore, MemoryStore, SharedStore,
    SystemClock,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, error, info, warn, Level};

use crate::config::{StoreBackend, WebhookConfig};
use crate::dialogflow::{IntentAction, IntentRouter, WebhookRequest, WebhookResponse};
use crate::error::WebhookError;

pub const SERVICE_NAME: &str = "Dialogflow Webhook";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    controller: FallbackController,
    intents: Arc<IntentRouter>,
}

impl AppState {
    pub fn new(controller: FallbackController) -> Self {
        Self {
            controller,
            intents: Arc::new(IntentRouter::fallback_only()),
        }
    }

    pub fn controller(&self) -> &FallbackController {
        &self.controller
    }
}

/// Body of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub timestamp: String,
    pub thai_time: String,
    pub service: String,
    #[serde(rename = "firebase_status")]
    pub store_status: String,
    pub store: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/webhook", post(webhook))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Bangkok wall-clock time the way the th-TH locale prints it:
/// `D/M/YYYY HH:MM:SS` with a Buddhist-era year.
pub fn thai_display_time(now: DateTime<Utc>, hours: &BusinessHours) -> String {
    let local = hours.localize(now);
    format!(
        "{}/{}/{} {}",
        local.day(),
        local.month(),
        local.year() + 543,
        local.format("%H:%M:%S")
    )
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let controller = state.controller();
    let now = controller.clock().now();
    Json(StatusResponse {
        status: "online".to_string(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        thai_time: thai_display_time(now, controller.business_hours()),
        service: SERVICE_NAME.to_string(),
        store_status: "initialized".to_string(),
        store: controller.store().name().to_string(),
    })
}

/// Declared body length, if the client sent a parseable `Content-Length`
fn request_body_size(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<WebhookRequest>,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let intent = request.intent_name();
    debug!(?headers, "Webhook request headers");
    info!(
        body_size = request_body_size(&headers),
        user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("<none>"),
        session = %request.session,
        intent = intent.unwrap_or("<none>"),
        source = request
            .original_detect_intent_request
            .as_ref()
            .and_then(|r| r.source.as_deref())
            .unwrap_or("<none>"),
        "Received webhook request"
    );

    let action = intent
        .and_then(|name| state.intents.resolve(name))
        .ok_or_else(|| WebhookError::NoHandler {
            intent: intent.map(str::to_string),
        })?;

    let response = match action {
        IntentAction::Fallback => {
            let controller = state.controller();
            let outcome = controller.handle_fallback(request.user_id()).await;
            WebhookResponse::text(controller.response_text(&outcome))
        }
    };

    info!("Successfully processed webhook request");
    Ok(Json(response))
}

/// Construct the configured store backend
pub fn build_store(config: &WebhookConfig) -> Result<SharedStore> {
    let store: SharedStore = match &config.store {
        StoreBackend::Firebase(firebase) => Arc::new(
            FirebaseStore::new(firebase.clone()).context("Failed to initialize Firebase store")?,
        ),
        StoreBackend::Memory => {
            warn!("Using in-memory store; fallback records are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

/// Build everything from `config` and serve until Ctrl-C
pub async fn run(config: WebhookConfig) -> Result<()> {
    let store = build_store(&config)?;
    info!(store = store.name(), location = config.store_location(), "Checking store connectivity");
    // Startup continues without a reachable store; each request reports its own failure.
    match store.health_check().await {
        Ok(()) => info!(store = store.name(), "Store read/write check successful"),
        Err(e) => error!(store = store.name(), error = %e, "Store read/write check failed"),
    }

    let controller = FallbackController::new(store, Arc::new(SystemClock))
        .with_config(CooldownConfig::default().with_cooldown(config.cooldown));
    let now = controller.clock().now();
    let thai_time = thai_display_time(now, controller.business_hours());
    let app = build_router(AppState::new(controller));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    info!(
        addr = %config.bind,
        environment = %config.environment,
        project = config.project_id.as_deref().unwrap_or("<unset>"),
        database = config.store_location(),
        cooldown_ms = config.cooldown.num_milliseconds(),
        server_time = %now.to_rfc3339_opts(SecondsFormat::Millis, true),
        %thai_time,
        "Server is running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
