use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use unzip_pipeline_core::contract::{encode_record, CompletionRecord, ContractError};
use unzip_pipeline_core::selection::{output_key_for_entry, select_archives, CollisionPolicy};
use unzip_pipeline_core::storage_keys::completion_record_key;

use crate::adapters::clock::Clock;
use crate::adapters::object_store::ObjectStore;
use crate::adapters::AdapterError;
use crate::config::WorkerConfig;
use crate::extract::{extract_archive, ExtractError};

const SCRATCH_ARCHIVE_NAME: &str = "archive.tar.gz";
const SCRATCH_ENTRIES_DIR: &str = "entries";

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("failed to list input bucket '{bucket}': {source}")]
    List {
        bucket: String,
        #[source]
        source: AdapterError,
    },
    #[error("failed to download archive '{key}': {source}")]
    Download {
        key: String,
        #[source]
        source: AdapterError,
    },
    #[error("archive '{0}' disappeared between listing and download")]
    ArchiveMissing(String),
    #[error("failed to extract archive '{key}': {source}")]
    Extract {
        key: String,
        #[source]
        source: ExtractError,
    },
    #[error("failed to upload '{output_key}' extracted from '{archive_key}': {source}")]
    Upload {
        archive_key: String,
        output_key: String,
        #[source]
        source: AdapterError,
    },
    #[error("output key '{output_key}' from archive '{archive_key}' was already written in this run")]
    OutputCollision {
        archive_key: String,
        output_key: String,
    },
    #[error("failed to prepare scratch space: {0}")]
    Scratch(#[source] std::io::Error),
    #[error("failed to write completion record '{key}': {source}")]
    CompletionRecord {
        key: String,
        #[source]
        source: AdapterError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedArchive {
    pub archive_key: String,
    pub uploaded_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerReport {
    pub job_id: String,
    pub archives: Vec<ProcessedArchive>,
    pub completion_key: String,
    pub end_time: f64,
}

impl WorkerReport {
    pub fn uploaded_file_count(&self) -> usize {
        self.archives
            .iter()
            .map(|archive| archive.uploaded_keys.len())
            .sum()
    }
}

/// Extracts the selected archives from the input bucket into the output
/// bucket, then writes this job's completion record.
///
/// The first failure aborts the run; no completion record is written then.
pub fn handle_worker_run(
    config: &WorkerConfig,
    input_store: &impl ObjectStore,
    output_store: &impl ObjectStore,
    status_store: &impl ObjectStore,
    clock: &impl Clock,
) -> Result<WorkerReport, WorkerError> {
    let started_at = Instant::now();

    let listed = input_store
        .list_keys("")
        .map_err(|source| WorkerError::List {
            bucket: config.input_bucket.clone(),
            source,
        })?;
    let selected = select_archives(listed.iter().map(String::as_str), config.batch_size);
    info!(
        component = "worker",
        event = "archives_selected",
        job_id = %config.job_id,
        listed = listed.len(),
        selected = selected.len(),
        batch_size = %config.batch_size,
    );

    let mut written_keys = BTreeSet::new();
    let mut archives = Vec::with_capacity(selected.len());
    for archive_key in selected {
        let uploaded_keys = process_archive(
            &archive_key,
            config.collision_policy,
            input_store,
            output_store,
            &mut written_keys,
        )?;
        info!(
            component = "worker",
            event = "archive_processed",
            job_id = %config.job_id,
            archive_key = %archive_key,
            uploaded = uploaded_keys.len(),
        );
        archives.push(ProcessedArchive {
            archive_key,
            uploaded_keys,
        });
    }

    let record = CompletionRecord::new(&config.job_id, clock.now_epoch_seconds())?;
    let completion_key = completion_record_key(&config.run_scope, &record.job_id);
    status_store
        .put_object(&completion_key, &encode_record(&record)?)
        .map_err(|source| WorkerError::CompletionRecord {
            key: completion_key.clone(),
            source,
        })?;

    let report = WorkerReport {
        job_id: record.job_id,
        archives,
        completion_key,
        end_time: record.end_time,
    };
    info!(
        component = "worker",
        event = "job_completed",
        job_id = %report.job_id,
        archives = report.archives.len(),
        uploaded = report.uploaded_file_count(),
        completion_key = %report.completion_key,
        duration_ms = started_at.elapsed().as_millis() as u64,
    );
    Ok(report)
}

/// Downloads, extracts and uploads one archive inside its own scratch directory.
fn process_archive(
    archive_key: &str,
    collision_policy: CollisionPolicy,
    input_store: &impl ObjectStore,
    output_store: &impl ObjectStore,
    written_keys: &mut BTreeSet<String>,
) -> Result<Vec<String>, WorkerError> {
    let scratch = tempfile::tempdir().map_err(WorkerError::Scratch)?;
    let archive_path = scratch.path().join(SCRATCH_ARCHIVE_NAME);
    let entries_dir = scratch.path().join(SCRATCH_ENTRIES_DIR);
    fs::create_dir_all(&entries_dir).map_err(WorkerError::Scratch)?;

    let found = input_store
        .download_to_path(archive_key, &archive_path)
        .map_err(|source| WorkerError::Download {
            key: archive_key.to_string(),
            source,
        })?;
    if !found {
        return Err(WorkerError::ArchiveMissing(archive_key.to_string()));
    }

    let extracted =
        extract_archive(&archive_path, &entries_dir).map_err(|source| WorkerError::Extract {
            key: archive_key.to_string(),
            source,
        })?;

    let mut uploaded_keys = Vec::with_capacity(extracted.len());
    for file in extracted {
        let Some(output_key) = output_key_for_entry(&file.entry_path) else {
            continue;
        };
        check_collision(archive_key, &output_key, collision_policy, written_keys)?;
        upload(archive_key, &output_key, &file.local_path, output_store)?;
        written_keys.insert(output_key.clone());
        uploaded_keys.push(output_key);
    }

    Ok(uploaded_keys)
}

fn check_collision(
    archive_key: &str,
    output_key: &str,
    collision_policy: CollisionPolicy,
    written_keys: &BTreeSet<String>,
) -> Result<(), WorkerError> {
    if !written_keys.contains(output_key) {
        return Ok(());
    }
    match collision_policy {
        CollisionPolicy::Overwrite => {
            warn!(
                component = "worker",
                event = "output_overwritten",
                archive_key = %archive_key,
                output_key = %output_key,
            );
            Ok(())
        }
        CollisionPolicy::Fail => Err(WorkerError::OutputCollision {
            archive_key: archive_key.to_string(),
            output_key: output_key.to_string(),
        }),
    }
}

fn upload(
    archive_key: &str,
    output_key: &str,
    local_path: &Path,
    output_store: &impl ObjectStore,
) -> Result<(), WorkerError> {
    output_store
        .put_file(output_key, local_path)
        .map_err(|source| WorkerError::Upload {
            archive_key: archive_key.to_string(),
            output_key: output_key.to_string(),
            source,
        })
}
