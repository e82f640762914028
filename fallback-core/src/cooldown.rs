//! Fallback cooldown controller.
//!
//! Decides, per user, whether a fallback event gets an escalation reply.
//!
//! # Decision
//!
//! ```text
//! user id (empty → "unknown")
//!   └─ read record (missing → lastFallbackTime = 0)
//!        elapsed = now_ms - lastFallbackTime
//!        ├─ elapsed >= cooldown → merge {lastFallbackTime: now_ms, lastUpdated, userId}
//!        │     ├─ ok    → Escalated(short | long by business hours)
//!        │     └─ error → Failed(StoreWrite)
//!        └─ elapsed <  cooldown → Suppressed (no write)
//! ```
//!
//! # Concurrency
//!
//! Read-then-write is not transactional. Two fallbacks for the same user
//! racing past an expired cooldown can both escalate; the store keeps
//! whichever write lands last. With human-paced chat and a five-hour window
//! this is tolerated, and no lock or compare-and-swap is taken.

use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info};

use crate::business_hours::{civil_time_iso_string, BusinessHours};
use crate::clock::Clock;
use crate::error::FallbackError;
use crate::messages::EscalationMessages;
use crate::record::FallbackUpdate;
use crate::store::FallbackStore;

/// Default minimum gap between two escalation replies to one user
pub const DEFAULT_COOLDOWN_MS: i64 = 18_000_000;

/// Key shared by every event that arrives without a user id
pub const UNKNOWN_USER: &str = "unknown";

/// Cooldown settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownConfig {
    /// Minimum time between escalations for one user
    pub cooldown: Duration,
    /// Substitute key for absent or empty user ids
    pub unknown_user: String,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::milliseconds(DEFAULT_COOLDOWN_MS),
            unknown_user: UNKNOWN_USER.to_string(),
        }
    }
}

impl CooldownConfig {
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

/// Result of one fallback decision
#[derive(Debug)]
pub enum FallbackOutcome {
    /// Cooldown had expired; the record was updated and this text goes out
    Escalated { message: String },
    /// Still inside the cooldown window. Nothing written, empty reply.
    Suppressed,
    /// The decision could not be completed
    Failed(FallbackError),
}

impl FallbackOutcome {
    pub fn is_escalated(&self) -> bool {
        matches!(self, Self::Escalated { .. })
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Text to show the end user: the escalation message, an empty string
    /// when suppressed, or the apology when the decision failed.
    pub fn response_text<'a>(&'a self, messages: &'a EscalationMessages) -> &'a str {
        match self {
            Self::Escalated { message } => message,
            Self::Suppressed => "",
            Self::Failed(_) => &messages.apology,
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Escalated { .. } => "escalated",
            Self::Suppressed => "suppressed",
            Self::Failed(_) => "failed",
        }
    }
}

/// Per-user cooldown gate in front of the escalation reply.
///
/// Holds no per-user state of its own; every call reads the store fresh.
#[derive(Clone)]
pub struct FallbackController {
    store: Arc<dyn FallbackStore>,
    clock: Arc<dyn Clock>,
    config: CooldownConfig,
    hours: BusinessHours,
    messages: EscalationMessages,
}

impl FallbackController {
    /// Controller with default cooldown, business hours and messages
    pub fn new(store: Arc<dyn FallbackStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            config: CooldownConfig::default(),
            hours: BusinessHours::default(),
            messages: EscalationMessages::default(),
        }
    }

    pub fn with_config(mut self, config: CooldownConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_business_hours(mut self, hours: BusinessHours) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_messages(mut self, messages: EscalationMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn config(&self) -> &CooldownConfig {
        &self.config
    }

    pub fn business_hours(&self) -> &BusinessHours {
        &self.hours
    }

    pub fn messages(&self) -> &EscalationMessages {
        &self.messages
    }

    pub fn store(&self) -> &Arc<dyn FallbackStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Store key for a possibly absent user id
    pub fn normalize_user_id<'a>(&'a self, user_id: Option<&'a str>) -> &'a str {
        match user_id {
            Some(id) if !id.is_empty() => id,
            _ => &self.config.unknown_user,
        }
    }

    /// See [`FallbackOutcome::response_text`]
    pub fn response_text<'a>(&'a self, outcome: &'a FallbackOutcome) -> &'a str {
        outcome.response_text(&self.messages)
    }

    /// Run one fallback decision for `user_id`.
    ///
    /// Never returns an error directly: failures come back as
    /// [`FallbackOutcome::Failed`] after being logged.
    pub async fn handle_fallback(&self, user_id: Option<&str>) -> FallbackOutcome {
        let user_id = self.normalize_user_id(user_id);
        info!(%user_id, "Processing fallback");

        match self.decide(user_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(%user_id, code = err.code(), error = %err, "Fallback handling failed");
                FallbackOutcome::Failed(err)
            }
        }
    }

    async fn decide(&self, user_id: &str) -> Result<FallbackOutcome, FallbackError> {
        let record = self
            .store
            .get(user_id)
            .await
            .map_err(|source| FallbackError::StoreRead {
                user_id: user_id.to_string(),
                source,
            })?;
        let last_fallback_time = record.map_or(0, |r| r.last_fallback_time);

        let now = self.clock.now();
        let now_ms = now.timestamp_millis();
        let elapsed_ms = now_ms.saturating_sub(last_fallback_time);
        let cooldown_ms = self.config.cooldown.num_milliseconds();

        if elapsed_ms < cooldown_ms {
            info!(
                %user_id,
                elapsed_ms,
                remaining_ms = cooldown_ms - elapsed_ms,
                "User is in cooldown period"
            );
            return Ok(FallbackOutcome::Suppressed);
        }

        let fields = FallbackUpdate {
            last_fallback_time: now_ms,
            last_updated: civil_time_iso_string(now, self.hours.zone()),
            user_id: user_id.to_string(),
        }
        .into_fields()
        .map_err(|e| FallbackError::Unknown {
            user_id: user_id.to_string(),
            message: e.to_string(),
        })?;

        self.store
            .update(user_id, fields)
            .await
            .map_err(|source| FallbackError::StoreWrite {
                user_id: user_id.to_string(),
                source,
            })?;
        info!(%user_id, last_fallback_time = now_ms, "Updated fallback time");

        let within_hours = self.hours.is_within(now);
        info!(
            %user_id,
            within_hours,
            "Business hours check: {}",
            if within_hours { "in hours" } else { "after hours" }
        );

        Ok(FallbackOutcome::Escalated {
            message: self.messages.select(within_hours).to_string(),
        })
    }
}
