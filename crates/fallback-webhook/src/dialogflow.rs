//! Dialogflow ES fulfillment envelope.
//!
//! Only the fields this service reads or writes are modelled; everything
//! else in the request is ignored.
//!
//! ```json
//! {
//!   "responseId": "…",
//!   "session": "projects/…/agent/sessions/…",
//!   "queryResult": { "queryText": "…", "intent": { "displayName": "Default Fallback Intent" } },
//!   "originalDetectIntentRequest": {
//!     "source": "line",
//!     "payload": { "data": { "source": { "userId": "U1234…" } } }
//!   }
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display name Dialogflow gives the built-in fallback intent
pub const DEFAULT_FALLBACK_INTENT: &str = "Default Fallback Intent";

/// Incoming fulfillment request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookRequest {
    pub response_id: String,
    pub session: String,
    pub query_result: QueryResult,
    pub original_detect_intent_request: Option<OriginalDetectIntentRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryResult {
    pub query_text: String,
    pub language_code: String,
    pub intent: Option<Intent>,
    pub intent_detection_confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Intent {
    pub name: String,
    pub display_name: String,
}

/// Platform-specific payload forwarded by the integration (LINE, etc.).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OriginalDetectIntentRequest {
    pub source: Option<String>,
    pub version: Option<String>,
    pub payload: Value,
}

impl WebhookRequest {
    /// Matched intent's display name
    pub fn intent_name(&self) -> Option<&str> {
        self.query_result
            .intent
            .as_ref()
            .map(|intent| intent.display_name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Chat-platform user id at `payload.data.source.userId`
    pub fn user_id(&self) -> Option<&str> {
        self.original_detect_intent_request
            .as_ref()?
            .payload
            .pointer("/data/source/userId")?
            .as_str()
    }
}

/// Outgoing fulfillment response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub fulfillment_text: String,
    pub fulfillment_messages: Vec<FulfillmentMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentMessage {
    pub text: TextMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    pub text: Vec<String>,
}

impl WebhookResponse {
    /// Single text reply. An empty string is sent as-is: Dialogflow shows
    /// nothing to the user.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            fulfillment_text: text.clone(),
            fulfillment_messages: vec![FulfillmentMessage {
                text: TextMessage { text: vec![text] },
            }],
        }
    }
}

/// What to do for a matched intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentAction {
    /// Cooldown-gated escalation reply
    Fallback,
}

/// Intent display name → handler
#[derive(Debug, Clone, Default)]
pub struct IntentRouter {
    routes: HashMap<String, IntentAction>,
}

impl IntentRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with only the default fallback intent registered
    pub fn fallback_only() -> Self {
        Self::new().route(DEFAULT_FALLBACK_INTENT, IntentAction::Fallback)
    }

    pub fn route(mut self, intent: impl Into<String>, action: IntentAction) -> Self {
        self.routes.insert(intent.into(), action);
        self
    }

    pub fn resolve(&self, intent: &str) -> Option<IntentAction> {
        self.routes.get(intent).copied()
    }
}
