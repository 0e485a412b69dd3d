//! In-memory bucket used by tests and local runs.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::object_store::ObjectStore;
use super::AdapterError;

/// Keys list in lexicographic order, matching S3 listing semantics.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    denied_write_suffix: Option<String>,
    writes: Mutex<Vec<String>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose writes fail for keys ending in `suffix`.
    pub fn denying_writes_to(suffix: impl Into<String>) -> Self {
        Self {
            denied_write_suffix: Some(suffix.into()),
            ..Self::default()
        }
    }

    pub fn seed_object(&self, key: &str, body: &[u8]) {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string(), body.to_vec());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .keys()
            .cloned()
            .collect()
    }

    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(key)
            .cloned()
    }

    /// Every successful write in order, including overwrites of the same key.
    pub fn write_log(&self) -> Vec<String> {
        self.writes.lock().expect("poisoned mutex").clone()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put_object(&self, key: &str, body: &[u8]) -> Result<(), AdapterError> {
        if let Some(suffix) = &self.denied_write_suffix {
            if key.ends_with(suffix.as_str()) {
                return Err(AdapterError::object_store("write", key, "write denied"));
            }
        }
        self.seed_object(key, body);
        self.writes
            .lock()
            .expect("poisoned mutex")
            .push(key.to_string());
        Ok(())
    }

    fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, AdapterError> {
        Ok(self.body(key))
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AdapterError> {
        Ok(self
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}
