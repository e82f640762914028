//! Dialogflow fulfillment webhook for the fallback intent.
//!
//! Wraps [`fallback_core::FallbackController`] in an axum server:
//!
//! - `GET /`: liveness and clock report
//! - `POST /webhook`: Dialogflow ES fulfillment
//!
//! # Usage
//!
//! ```bash
//! # Firebase-backed
//! FIREBASE_DATABASE_URL=https://my-db.firebaseio.com FIREBASE_AUTH_TOKEN=... fallback-webhook
//!
//! # Local run without a database
//! fallback-webhook --memory-store --port 8080
//! ```

pub mod config;
pub mod dialogflow;
pub mod error;
pub mod server;
pub mod telemetry;

pub use config::{Args, LogFormat, StoreBackend, WebhookConfig};
pub use server::{build_router, build_store, run, AppState};
