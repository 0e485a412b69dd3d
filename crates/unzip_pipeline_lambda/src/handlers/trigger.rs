use thiserror::Error;
use tracing::{error, info};
use unzip_pipeline_core::contract::{encode_record, ContractError, StartRecord, SubmissionResponse};
use unzip_pipeline_core::storage_keys::{start_record_key, RunScope};
use uuid::Uuid;

use crate::adapters::clock::Clock;
use crate::adapters::job_submitter::{JobSubmission, JobSubmitter};
use crate::adapters::object_store::ObjectStore;
use crate::adapters::AdapterError;
use crate::config::{TriggerConfig, RUN_ID_VAR};

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("failed to write start record: {0}")]
    StartRecord(#[source] AdapterError),
    #[error("job submission failed after the start record was written to '{start_key}': {source}")]
    Submission {
        start_key: String,
        #[source]
        source: AdapterError,
    },
}

/// Legacy configurations share the fixed start key; run-scoped ones get a fresh UUID.
pub fn new_run_scope(config: &TriggerConfig) -> RunScope {
    if config.run_scoped {
        RunScope::Run(Uuid::new_v4().to_string())
    } else {
        RunScope::Legacy
    }
}

/// Records the start time, then submits exactly one extraction job.
///
/// A failed submission is not retried and leaves the start record in place.
pub fn handle_trigger(
    config: &TriggerConfig,
    scope: &RunScope,
    status_store: &impl ObjectStore,
    submitter: &impl JobSubmitter,
    clock: &impl Clock,
) -> Result<SubmissionResponse, TriggerError> {
    let start = StartRecord::new(clock.now_epoch_seconds())?;
    let start_key = start_record_key(scope);

    status_store
        .put_object(&start_key, &encode_record(&start)?)
        .map_err(TriggerError::StartRecord)?;
    info!(
        component = "trigger",
        event = "start_recorded",
        start_key = %start_key,
        start_time = start.start_time,
        run_id = scope.run_id(),
    );

    let submission = JobSubmission {
        job_name: config.job_name.clone(),
        job_queue: config.job_queue.clone(),
        job_definition: config.job_definition.clone(),
        environment: scope
            .run_id()
            .map(|run_id| vec![(RUN_ID_VAR.to_string(), run_id.to_string())])
            .unwrap_or_default(),
    };

    let submitted = submitter.submit_job(&submission).map_err(|source| {
        error!(
            component = "trigger",
            event = "submission_failed",
            job_queue = %submission.job_queue,
            error = %source,
        );
        TriggerError::Submission {
            start_key: start_key.clone(),
            source,
        }
    })?;

    info!(
        component = "trigger",
        event = "job_submitted",
        job_id = %submitted.job_id,
        job_name = %submitted.job_name,
        job_queue = %submission.job_queue,
    );

    Ok(SubmissionResponse {
        job_name: submitted.job_name,
        job_id: submitted.job_id,
        job_arn: submitted.job_arn,
        run_id: scope.run_id().map(str::to_string),
    })
}
