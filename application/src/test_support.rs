//! In-crate store double with fault injection for service tests.

use crate::{ApplicationError, KeyValueStore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub(crate) struct FakeStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
    fail_get: Mutex<HashSet<String>>,
    fail_put: Mutex<HashSet<String>>,
    puts: AtomicUsize,
}

impl FakeStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail_get_on(&self, key: &str) {
        self.fail_get.lock().unwrap().insert(key.to_string());
    }

    pub(crate) fn fail_put_on(&self, key: &str) {
        self.fail_put.lock().unwrap().insert(key.to_string());
    }

    pub(crate) fn seed(&self, key: &str, value: &[u8]) {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
    }

    pub(crate) fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.data.lock().unwrap().get(key).cloned()
    }

    /// Successful writes so far (a batch counts once per entry).
    pub(crate) fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn check_put(&self, key: &str) -> Result<(), ApplicationError> {
        if self.fail_put.lock().unwrap().contains(key) {
            return Err(ApplicationError::StoreError(format!(
                "injected put failure for '{}'",
                key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FakeStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ApplicationError> {
        if self.fail_get.lock().unwrap().contains(key) {
            return Err(ApplicationError::StoreError(format!(
                "injected get failure for '{}'",
                key
            )));
        }
        Ok(self.raw(key))
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), ApplicationError> {
        self.check_put(key)?;
        self.seed(key, value);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    // All-or-nothing: every key is checked before anything is written.
    async fn put_batch(&self, entries: &[(String, Vec<u8>)]) -> Result<(), ApplicationError> {
        for (key, _) in entries {
            self.check_put(key)?;
        }
        for (key, value) in entries {
            self.seed(key, value);
            self.puts.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
