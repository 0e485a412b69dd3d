//! Shared archive unzip pipeline domain primitives.
//!
//! This crate owns record contracts, the storage key layout, archive
//! selection and timing aggregation. It intentionally excludes AWS SDK and
//! Lambda runtime concerns, which live in `unzip_pipeline_lambda`.

pub mod contract;
pub mod selection;
pub mod storage_keys;
pub mod timing;
