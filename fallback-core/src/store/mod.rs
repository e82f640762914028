//! Key-value store seam for per-user fallback records.
//!
//! The controller only needs two operations: read one record, and merge a
//! few fields into it (creating it when absent). Backends:
//!
//! - [`MemoryStore`]: in-process map, for local runs and tests
//! - [`FirebaseStore`]: Firebase Realtime Database over its REST API
//!
//! Records live under `users/{user_id}`. Connection lifecycle, credentials
//! and timeouts belong to the backend, not to the controller.

mod firebase;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreResult;
use crate::record::UserFallbackRecord;

pub use firebase::{FirebaseConfig, FirebaseStore};
pub use memory::MemoryStore;

/// Root node holding one child per user.
pub const USERS_NODE: &str = "users";

/// Node written by the startup connectivity check.
pub const SYSTEM_STATUS_NODE: &str = "system_status";

/// Shared store handle, constructed once at startup.
pub type SharedStore = Arc<dyn FallbackStore>;

/// Store operations required by the fallback controller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FallbackStore: Send + Sync {
    /// Short backend name for logs and the status route.
    fn name(&self) -> &'static str;

    /// Read the record for `user_id`. `None` when no record exists.
    async fn get(&self, user_id: &str) -> StoreResult<Option<UserFallbackRecord>>;

    /// Merge `fields` into the record for `user_id`, creating it if absent.
    /// Fields not named in `fields` are left untouched.
    async fn update(&self, user_id: &str, fields: Map<String, Value>) -> StoreResult<()>;

    /// Round-trip connectivity check.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
