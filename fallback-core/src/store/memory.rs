//! In-process store with merge-update semantics.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::FallbackStore;
use crate::error::{StoreError, StoreResult};
use crate::record::UserFallbackRecord;

/// HashMap-backed store. Records are kept as raw JSON objects so that
/// fields this crate does not know about survive updates.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw record, replacing anything stored under `user_id`.
    pub fn insert_raw(&self, user_id: &str, record: Map<String, Value>) -> StoreResult<()> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        users.insert(user_id.to_string(), record);
        Ok(())
    }

    /// Raw stored object for `user_id`.
    pub fn raw(&self, user_id: &str) -> StoreResult<Option<Map<String, Value>>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(user_id).cloned())
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

#[async_trait]
impl FallbackStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, user_id: &str) -> StoreResult<Option<UserFallbackRecord>> {
        let Some(raw) = self.raw(user_id)? else {
            return Ok(None);
        };
        UserFallbackRecord::from_value(Value::Object(raw)).map_err(|source| StoreError::Decode {
            key: user_id.to_string(),
            source,
        })
    }

    async fn update(&self, user_id: &str, fields: Map<String, Value>) -> StoreResult<()> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        let record = users.entry(user_id.to_string()).or_default();
        for (key, value) in fields {
            // Writing null deletes the child, as in the Realtime Database.
            if value.is_null() {
                record.remove(&key);
            } else {
                record.insert(key, value);
            }
        }
        Ok(())
    }
}
