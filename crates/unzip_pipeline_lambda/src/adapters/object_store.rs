use std::fs;
use std::path::Path;

use super::AdapterError;

/// Key/value view of a single bucket.
pub trait ObjectStore {
    fn put_object(&self, key: &str, body: &[u8]) -> Result<(), AdapterError>;

    /// Returns `Ok(None)` when the key does not exist.
    fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, AdapterError>;

    /// Every key under `prefix`, in the store's listing order.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, AdapterError>;

    fn put_file(&self, key: &str, path: &Path) -> Result<(), AdapterError> {
        let body = fs::read(path).map_err(|source| AdapterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.put_object(key, &body)
    }

    /// Writes the object to `path`; `Ok(false)` when the key does not exist.
    fn download_to_path(&self, key: &str, path: &Path) -> Result<bool, AdapterError> {
        let Some(body) = self.get_object(key)? else {
            return Ok(false);
        };
        fs::write(path, body).map_err(|source| AdapterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(true)
    }
}
