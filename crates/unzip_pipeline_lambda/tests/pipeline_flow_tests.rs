use std::sync::Mutex;

use unzip_pipeline_lambda::adapters::clock::FixedClock;
use unzip_pipeline_lambda::adapters::job_submitter::{JobSubmission, JobSubmitter, SubmittedJob};
use unzip_pipeline_lambda::adapters::memory::InMemoryObjectStore;
use unzip_pipeline_lambda::adapters::AdapterError;
use unzip_pipeline_lambda::config::{TriggerConfig, WorkerConfig, RUN_ID_VAR};
use unzip_pipeline_lambda::handlers::aggregator::handle_aggregation;
use unzip_pipeline_lambda::handlers::trigger::{handle_trigger, new_run_scope};
use unzip_pipeline_lambda::handlers::worker::handle_worker_run;
use unzip_pipeline_lambda::runtime::selection::{ArchiveBatchSize, CollisionPolicy};
use unzip_pipeline_lambda::runtime::storage_keys::RunScope;
use unzip_pipeline_lambda::test_helpers::build_tar_gz;

/// Hands out sequential job ids and remembers the environment each job was given.
struct SequentialSubmitter {
    submitted: Mutex<Vec<JobSubmission>>,
}

impl SequentialSubmitter {
    fn new() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn last(&self) -> JobSubmission {
        self.submitted
            .lock()
            .expect("poisoned mutex")
            .last()
            .cloned()
            .expect("a job should have been submitted")
    }
}

impl JobSubmitter for SequentialSubmitter {
    fn submit_job(&self, submission: &JobSubmission) -> Result<SubmittedJob, AdapterError> {
        let mut submitted = self.submitted.lock().expect("poisoned mutex");
        submitted.push(submission.clone());
        Ok(SubmittedJob {
            job_id: format!("job-{}", submitted.len()),
            job_name: submission.job_name.clone(),
            job_arn: None,
        })
    }
}

fn trigger_config(run_scoped: bool) -> TriggerConfig {
    TriggerConfig {
        status_bucket: "status".to_string(),
        job_name: "unzip".to_string(),
        job_queue: "unzip-queue".to_string(),
        job_definition: "unzip-definition".to_string(),
        run_scoped,
    }
}

/// Mirrors what the Batch container sees: the job id plus any submitted overrides.
fn worker_config_for(job_id: &str, submission: &JobSubmission) -> WorkerConfig {
    let run_id = submission
        .environment
        .iter()
        .find(|(name, _)| name == RUN_ID_VAR)
        .map(|(_, value)| value.clone());
    WorkerConfig {
        input_bucket: "input".to_string(),
        output_bucket: "output".to_string(),
        status_bucket: "status".to_string(),
        job_id: job_id.to_string(),
        run_scope: RunScope::from_run_id(run_id),
        batch_size: ArchiveBatchSize::default(),
        collision_policy: CollisionPolicy::Overwrite,
    }
}

fn seeded_input() -> InMemoryObjectStore {
    let input = InMemoryObjectStore::new();
    input.seed_object("a.tar.gz", &build_tar_gz(&[("a.txt", b"alpha".as_slice())]));
    input.seed_object("b.tar.gz", &build_tar_gz(&[("b.txt", b"bravo".as_slice())]));
    input.seed_object("c.tar.gz", &build_tar_gz(&[("c.txt", b"charlie".as_slice())]));
    input
}

#[test]
fn trigger_worker_aggregator_round_trip() {
    let input = seeded_input();
    let output = InMemoryObjectStore::new();
    let status = InMemoryObjectStore::new();
    let submitter = SequentialSubmitter::new();

    let config = trigger_config(false);
    let scope = new_run_scope(&config);
    let response = handle_trigger(&config, &scope, &status, &submitter, &FixedClock(100.0))
        .expect("trigger should succeed");

    let worker_config = worker_config_for(&response.job_id, &submitter.last());
    let report = handle_worker_run(
        &worker_config,
        &input,
        &output,
        &status,
        &FixedClock(200.0),
    )
    .expect("worker should succeed");
    assert_eq!(report.completion_key, format!("unzip_status/{}.json", response.job_id));
    assert_eq!(output.keys(), vec!["a.txt", "b.txt"]);

    let outcome = handle_aggregation(&RunScope::Legacy, &status).expect("aggregation should pass");
    assert_eq!(outcome.completion_records, 1);
    assert_eq!(outcome.summary.end_time, Some(200.0));
    assert_eq!(outcome.summary.total_time, Some(100.0));
    assert_eq!(
        status.body("unzip_results.csv").expect("report should exist"),
        b"Start_Time,End_Time,Total_Time\n100.0,200.0,100.0\n"
    );
}

#[test]
fn latest_of_several_jobs_determines_total() {
    let input = seeded_input();
    let output = InMemoryObjectStore::new();
    let status = InMemoryObjectStore::new();
    let submitter = SequentialSubmitter::new();
    let config = trigger_config(false);

    handle_trigger(&config, &RunScope::Legacy, &status, &submitter, &FixedClock(100.0))
        .expect("trigger should succeed");
    for (job_id, end_time) in [("job-early", 150.0), ("job-late", 200.0)] {
        let worker_config = worker_config_for(job_id, &submitter.last());
        handle_worker_run(&worker_config, &input, &output, &status, &FixedClock(end_time))
            .expect("worker should succeed");
    }

    let outcome = handle_aggregation(&RunScope::Legacy, &status).expect("aggregation should pass");
    assert_eq!(outcome.completion_records, 2);
    assert_eq!(outcome.summary.end_time, Some(200.0));
    assert_eq!(outcome.summary.total_time, Some(100.0));
}

#[test]
fn concurrent_run_scoped_pipelines_do_not_interfere() {
    let input = seeded_input();
    let output = InMemoryObjectStore::new();
    let status = InMemoryObjectStore::new();
    let submitter = SequentialSubmitter::new();
    let config = trigger_config(true);

    let first_scope = new_run_scope(&config);
    let first = handle_trigger(&config, &first_scope, &status, &submitter, &FixedClock(10.0))
        .expect("first trigger should succeed");
    let first_submission = submitter.last();

    let second_scope = new_run_scope(&config);
    let second = handle_trigger(&config, &second_scope, &status, &submitter, &FixedClock(50.0))
        .expect("second trigger should succeed");
    let second_submission = submitter.last();

    handle_worker_run(
        &worker_config_for(&second.job_id, &second_submission),
        &input,
        &output,
        &status,
        &FixedClock(70.0),
    )
    .expect("second worker should succeed");
    handle_worker_run(
        &worker_config_for(&first.job_id, &first_submission),
        &input,
        &output,
        &status,
        &FixedClock(90.0),
    )
    .expect("first worker should succeed");

    let first_outcome =
        handle_aggregation(&first_scope, &status).expect("first aggregation should pass");
    let second_outcome =
        handle_aggregation(&second_scope, &status).expect("second aggregation should pass");

    assert_eq!(first_outcome.summary.total_time, Some(80.0));
    assert_eq!(second_outcome.summary.total_time, Some(20.0));
    assert_ne!(first_outcome.report_key, second_outcome.report_key);
}

#[test]
fn aggregation_before_any_worker_reports_null_total() {
    let status = InMemoryObjectStore::new();
    let submitter = SequentialSubmitter::new();
    let config = trigger_config(false);

    handle_trigger(&config, &RunScope::Legacy, &status, &submitter, &FixedClock(100.0))
        .expect("trigger should succeed");

    let outcome = handle_aggregation(&RunScope::Legacy, &status).expect("aggregation should pass");
    assert_eq!(outcome.summary.total_time, None);
    assert_eq!(
        status.body("unzip_results.csv").expect("report should exist"),
        b"Start_Time,End_Time,Total_Time\n100.0,null,null\n"
    );
}
