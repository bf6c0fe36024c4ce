use std::sync::Arc;

use serde_json::Value;

use crate::cache::HistoryStorage;
use crate::config::{HISTORY_LIMIT, HISTORY_STORAGE_KEY};
use crate::error::StorageError;
use crate::models::Generation;

/// Most-recent-first list of generations, capped at [`HISTORY_LIMIT`].
///
/// Storage failures never reach the caller: reads degrade to an empty list
/// and writes are logged and dropped, so the returned list is always the
/// correct in-memory state even when it was not persisted.
#[derive(Clone)]
pub struct HistoryCache {
    storage: Arc<dyn HistoryStorage>,
}

impl HistoryCache {
    pub fn new(storage: Arc<dyn HistoryStorage>) -> Self {
        Self { storage }
    }

    pub fn load(&self) -> Vec<Generation> {
        let bytes = match self.storage.get(HISTORY_STORAGE_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load generation history");
                return Vec::new();
            }
        };

        let items = match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Array(items)) => items,
            Ok(_) => return Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load generation history");
                return Vec::new();
            }
        };

        items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Generation>(item).ok())
            .take(HISTORY_LIMIT)
            .collect()
    }

    pub fn append(&self, generation: Generation) -> Vec<Generation> {
        let mut history = Vec::with_capacity(HISTORY_LIMIT + 1);
        history.push(generation);
        history.extend(self.load());
        history.truncate(HISTORY_LIMIT);

        if let Err(err) = self.save(&history) {
            tracing::warn!(error = %err, "failed to save generation history");
        }
        history
    }

    pub fn clear(&self) {
        if let Err(err) = self.storage.remove(HISTORY_STORAGE_KEY) {
            tracing::warn!(error = %err, "failed to clear generation history");
        }
    }

    fn save(&self, history: &[Generation]) -> Result<(), StorageError> {
        let limited = &history[..history.len().min(HISTORY_LIMIT)];
        let payload = serde_json::to_vec(limited)?;
        self.storage.put(HISTORY_STORAGE_KEY, &payload)
    }
}
