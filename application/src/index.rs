//! The two global key indices: personnel ids and project keys.
//!
//! Each index is a `KeyIndex` stored under a fixed key. Indices are only
//! ever appended to, and only by the creation paths.

use crate::{ApplicationError, CreationPolicy, KeyValueStore, load_record};
use domain::{KeyIndex, Record};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub const PERSONNEL_INDEX_KEY: &str = "_employeeindex";
pub const PROJECT_INDEX_KEY: &str = "_projectindex";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexName {
    Personnel,
    Project,
}

impl IndexName {
    /// Well-known store key holding this index.
    pub const fn key(self) -> &'static str {
        match self {
            IndexName::Personnel => PERSONNEL_INDEX_KEY,
            IndexName::Project => PROJECT_INDEX_KEY,
        }
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexName::Personnel => f.write_str("employee"),
            IndexName::Project => f.write_str("project"),
        }
    }
}

#[derive(Clone)]
pub struct IndexManager {
    store: Arc<dyn KeyValueStore>,
}

impl IndexManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current contents of `index`; an index that was never written is empty.
    #[instrument(skip(self))]
    pub async fn load(&self, index: IndexName) -> Result<KeyIndex, ApplicationError> {
        let entries = load_record::<KeyIndex>(self.store.as_ref(), index.key())
            .await
            .map_err(|e| {
                error!(index = %index, "Failed to read index: {}", e);
                ApplicationError::StoreError(format!("Failed to get {} index: {}", index, e))
            })?;
        Ok(entries.unwrap_or_default())
    }

    /// Appends `entry` to `index` and writes the index back.
    /// No existence or duplicate check happens here.
    #[instrument(skip(self))]
    pub async fn append(&self, index: IndexName, entry: &str) -> Result<(), ApplicationError> {
        let mut entries = self.load(index).await?;
        entries.push(entry);
        let bytes = entries.encode()?;
        self.store.put(index.key(), &bytes).await.map_err(|e| {
            error!(index = %index, entry = %entry, "Failed to write index: {}", e);
            e
        })?;
        debug!(index = %index, entry = %entry, len = entries.len(), "Index entry appended");
        Ok(())
    }

    /// Writes a freshly created record at `key` and registers `key` in `index`.
    ///
    /// With [`CreationPolicy::Sequential`] the record is written first; if the
    /// index append then fails the record stays in place, unindexed, and the
    /// call still succeeds. With [`CreationPolicy::Atomic`] both writes go out
    /// through one `put_batch`, and any failure fails the call.
    #[instrument(skip(self, record))]
    pub(crate) async fn store_created(
        &self,
        policy: CreationPolicy,
        index: IndexName,
        key: &str,
        record: Vec<u8>,
    ) -> Result<(), ApplicationError> {
        match policy {
            CreationPolicy::Sequential => {
                self.store.put(key, &record).await?;
                info!(index = %index, key = %key, "Record written");
                if let Err(e) = self.append(index, key).await {
                    warn!(index = %index, key = %key, "Record written but not indexed: {}", e);
                }
                Ok(())
            }
            CreationPolicy::Atomic => {
                let mut entries = self.load(index).await?;
                entries.push(key);
                let batch = vec![
                    (key.to_string(), record),
                    (index.key().to_string(), entries.encode()?),
                ];
                self.store.put_batch(&batch).await.map_err(|e| {
                    error!(index = %index, key = %key, "Failed to commit record with index: {}", e);
                    e
                })?;
                info!(index = %index, key = %key, "Record and index entry committed together");
                Ok(())
            }
        }
    }
}
