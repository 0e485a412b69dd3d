use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use unzip_pipeline_core::contract::{
    decode_completion_record, decode_start_record, ContractError,
};
use unzip_pipeline_core::storage_keys::{
    completion_record_job_id, start_record_key, status_prefix, summary_report_key, RunScope,
};
use unzip_pipeline_core::timing::{render_summary_csv, summarize, TimingSummary};

use crate::adapters::object_store::ObjectStore;
use crate::adapters::AdapterError;

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("start record '{0}' does not exist")]
    StartRecordMissing(String),
    #[error("completion record '{0}' disappeared between listing and read")]
    CompletionRecordMissing(String),
    #[error(transparent)]
    Store(#[from] AdapterError),
}

/// Optional Lambda payload selecting a run scope; an empty payload means legacy keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregationRequest {
    #[serde(default)]
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregationOutcome {
    pub summary: TimingSummary,
    pub completion_records: usize,
    pub report_key: String,
}

/// Reads the start and completion records of `scope` and writes the CSV summary.
pub fn handle_aggregation(
    scope: &RunScope,
    status_store: &impl ObjectStore,
) -> Result<AggregationOutcome, AggregatorError> {
    let start_key = start_record_key(scope);
    let start_body = status_store
        .get_object(&start_key)?
        .ok_or_else(|| AggregatorError::StartRecordMissing(start_key.clone()))?;
    let start = decode_start_record(&start_key, &start_body)?;

    let mut completions = Vec::new();
    for key in status_store.list_keys(&status_prefix(scope))? {
        let Some(key_job_id) = completion_record_job_id(scope, &key) else {
            continue;
        };
        let body = status_store
            .get_object(&key)?
            .ok_or_else(|| AggregatorError::CompletionRecordMissing(key.clone()))?;
        let record = decode_completion_record(&key, &body)?;
        if record.job_id != key_job_id {
            return Err(ContractError::MalformedRecord {
                key: key.clone(),
                message: format!(
                    "job_id '{}' does not match the record key's job '{key_job_id}'",
                    record.job_id
                ),
            }
            .into());
        }
        completions.push(record);
    }

    let summary = summarize(&start, &completions);
    if summary.total_time.is_none() {
        warn!(
            component = "aggregator",
            event = "no_completion_records",
            start_key = %start_key,
        );
    }

    let report_key = summary_report_key(scope);
    status_store.put_object(&report_key, &render_summary_csv(&summary)?)?;
    info!(
        component = "aggregator",
        event = "summary_written",
        report_key = %report_key,
        completion_records = completions.len(),
        start_time = summary.start_time,
        end_time = summary.end_time,
        total_time = summary.total_time,
    );

    Ok(AggregationOutcome {
        summary,
        completion_records: completions.len(),
        report_key,
    })
}

#[cfg(test)]
mod tests {
    use unzip_pipeline_core::contract::{encode_record, CompletionRecord, StartRecord};
    use unzip_pipeline_core::storage_keys::completion_record_key;

    use super::*;
    use crate::adapters::memory::InMemoryObjectStore;

    fn seed_start(store: &InMemoryObjectStore, scope: &RunScope, start_time: f64) {
        let record = StartRecord::new(start_time).expect("start should be valid");
        store.seed_object(
            &start_record_key(scope),
            &encode_record(&record).expect("record should encode"),
        );
    }

    fn seed_completion(store: &InMemoryObjectStore, scope: &RunScope, job_id: &str, end: f64) {
        let record = CompletionRecord::new(job_id, end).expect("record should be valid");
        store.seed_object(
            &completion_record_key(scope, job_id),
            &encode_record(&record).expect("record should encode"),
        );
    }

    #[test]
    fn writes_summary_from_latest_completion() {
        let store = InMemoryObjectStore::new();
        let scope = RunScope::Legacy;
        seed_start(&store, &scope, 100.0);
        seed_completion(&store, &scope, "job-a", 150.0);
        seed_completion(&store, &scope, "job-b", 200.0);

        let outcome = handle_aggregation(&scope, &store).expect("aggregation should pass");

        assert_eq!(outcome.completion_records, 2);
        assert_eq!(outcome.summary.total_time, Some(100.0));
        assert_eq!(outcome.report_key, "unzip_results.csv");
        assert_eq!(
            store.body("unzip_results.csv").expect("report should exist"),
            b"Start_Time,End_Time,Total_Time\n100.0,200.0,100.0\n"
        );
    }

    #[test]
    fn missing_start_record_fails_without_writing_report() {
        let store = InMemoryObjectStore::new();
        seed_completion(&store, &RunScope::Legacy, "job-a", 150.0);

        let error =
            handle_aggregation(&RunScope::Legacy, &store).expect_err("aggregation should fail");

        assert!(
            matches!(error, AggregatorError::StartRecordMissing(ref key) if key == "unzip_status/start_time.json")
        );
        assert!(store.body("unzip_results.csv").is_none());
    }

    #[test]
    fn no_completion_records_reports_null_total() {
        let store = InMemoryObjectStore::new();
        seed_start(&store, &RunScope::Legacy, 100.0);

        let outcome =
            handle_aggregation(&RunScope::Legacy, &store).expect("aggregation should pass");

        assert_eq!(outcome.completion_records, 0);
        assert_eq!(outcome.summary.total_time, None);
        assert_eq!(
            store.body("unzip_results.csv").expect("report should exist"),
            b"Start_Time,End_Time,Total_Time\n100.0,null,null\n"
        );
    }

    #[test]
    fn ignores_other_run_scopes_and_unrelated_objects() {
        let store = InMemoryObjectStore::new();
        let legacy = RunScope::Legacy;
        let other_run = RunScope::Run("run-2".to_string());
        seed_start(&store, &legacy, 10.0);
        seed_completion(&store, &legacy, "job-a", 20.0);
        seed_start(&store, &other_run, 500.0);
        seed_completion(&store, &other_run, "job-z", 900.0);
        store.seed_object("unzip_status/readme.txt", b"ignore me");

        let outcome = handle_aggregation(&legacy, &store).expect("aggregation should pass");
        assert_eq!(outcome.completion_records, 1);
        assert_eq!(outcome.summary.end_time, Some(20.0));

        let scoped = handle_aggregation(&other_run, &store).expect("aggregation should pass");
        assert_eq!(scoped.completion_records, 1);
        assert_eq!(scoped.summary.total_time, Some(400.0));
        assert_eq!(scoped.report_key, "unzip_results/run-2.csv");
    }

    #[test]
    fn malformed_completion_record_fails_aggregation() {
        let store = InMemoryObjectStore::new();
        seed_start(&store, &RunScope::Legacy, 10.0);
        store.seed_object("unzip_status/job-x.json", b"{not json");

        let error =
            handle_aggregation(&RunScope::Legacy, &store).expect_err("aggregation should fail");
        assert!(matches!(
            error,
            AggregatorError::Contract(ContractError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn completion_record_under_another_jobs_key_is_rejected() {
        let store = InMemoryObjectStore::new();
        seed_start(&store, &RunScope::Legacy, 10.0);
        let record = CompletionRecord::new("job-k", 30.0).expect("record should be valid");
        store.seed_object(
            "unzip_status/job-j.json",
            &encode_record(&record).expect("record should encode"),
        );

        let error =
            handle_aggregation(&RunScope::Legacy, &store).expect_err("aggregation should fail");
        match error {
            AggregatorError::Contract(ContractError::MalformedRecord { key, message }) => {
                assert_eq!(key, "unzip_status/job-j.json");
                assert!(message.contains("job-k"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.body("unzip_results.csv").is_none());
    }

    #[test]
    fn aggregation_request_defaults_to_legacy_scope() {
        let request: AggregationRequest =
            serde_json::from_value(serde_json::json!({})).expect("empty payload should parse");
        assert_eq!(request.run_id, None);
    }
}
