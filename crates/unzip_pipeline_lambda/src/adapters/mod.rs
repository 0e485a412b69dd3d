use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub mod batch;
pub mod clock;
pub mod job_submitter;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
pub mod object_store;
pub mod s3;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to {operation} object '{key}': {message}")]
    ObjectStore {
        operation: &'static str,
        key: String,
        message: String,
    },
    #[error("failed to submit batch job: {0}")]
    Submission(String),
    #[error("io error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AdapterError {
    pub fn object_store(operation: &'static str, key: &str, message: impl Into<String>) -> Self {
        Self::ObjectStore {
            operation,
            key: key.to_string(),
            message: message.into(),
        }
    }
}
