//! AWS-oriented adapters and handlers for the archive unzip pipeline.
//!
//! This crate owns runtime integration details (Lambda handlers, the Batch
//! worker entrypoint, S3 and Batch adapters, archive extraction) and
//! re-exports the domain primitives of `unzip_pipeline_core` as `runtime`.

pub mod adapters;
pub mod config;
pub mod extract;
pub mod handlers;
pub mod logging;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use unzip_pipeline_core as runtime;
