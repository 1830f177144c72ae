// ./infrastructure/src/persistence/in_memory_store.rs
use application::{ApplicationError, KeyValueStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Process-local key-value store backed by a concurrent map.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStore {
    // Key -> raw value bytes
    entries: Arc<DashMap<String, Arc<Vec<u8>>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Number of keys currently set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ApplicationError> {
        debug!(key = %key, "Getting value from in-memory store");
        // Clone the bytes out so no shard lock outlives the call
        Ok(self.entries.get(key).map(|value| (**value).clone()))
    }

    #[instrument(skip(self, value), fields(len = value.len()))]
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), ApplicationError> {
        debug!(key = %key, "Putting value into in-memory store");
        self.entries
            .insert(key.to_string(), Arc::new(value.to_vec()));
        Ok(())
    }

    /// In-memory inserts cannot fail, so a batch is all-or-nothing.
    /// Readers may observe a partially applied batch unless invocations are
    /// serialised by the caller (the ledger's invocation gate does this).
    #[instrument(skip(self, entries))]
    async fn put_batch(&self, entries: &[(String, Vec<u8>)]) -> Result<(), ApplicationError> {
        debug!(count = entries.len(), "Putting batch into in-memory store");
        for (key, value) in entries {
            self.entries.insert(key.clone(), Arc::new(value.clone()));
        }
        Ok(())
    }
}
