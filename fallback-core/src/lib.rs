//! Fallback escalation core
//!
//! Decides what a chatbot says when intent matching fails. The first
//! fallback for a user in any five-hour window produces an escalation
//! message ("a human agent will reply"); later fallbacks inside the window
//! stay silent so the user is not spammed.
//!
//! # Components
//!
//! - [`business_hours`]: pure civil-time window check (Asia/Bangkok)
//! - [`cooldown`]: the per-user cooldown controller
//! - [`store`]: key-value store seam plus in-memory and Firebase REST backends
//! - [`record`]: the persisted per-user record shape
//! - [`messages`]: reply texts for each outcome
//! - [`clock`]: injectable time source
//!
//! # Flow
//!
//! ```text
//! fallback event (user id)
//!   └─ read users/{id}
//!        ├─ elapsed >= cooldown → write {lastFallbackTime, ...} → business hours? → short | long
//!        │                          └─ write failed → Failed (apology upstream)
//!        └─ elapsed <  cooldown → Suppressed (empty reply, no write)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fallback_core::{FallbackController, MemoryStore, SystemClock};
//!
//! let controller = FallbackController::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock));
//! let outcome = controller.handle_fallback(Some("U1234")).await;
//! let reply = controller.response_text(&outcome);
//! ```

pub mod business_hours;
pub mod clock;
pub mod cooldown;
pub mod error;
pub mod messages;
pub mod record;
pub mod store;

pub use business_hours::{civil_time_iso_string, BusinessHours, CivilTime};
pub use clock::{Clock, ManualClock, SystemClock};
pub use cooldown::{CooldownConfig, FallbackController, FallbackOutcome};
pub use error::{FallbackError, StoreError, StoreResult};
pub use messages::EscalationMessages;
pub use record::{FallbackUpdate, UserFallbackRecord};
pub use store::{FallbackStore, FirebaseConfig, FirebaseStore, MemoryStore, SharedStore};
