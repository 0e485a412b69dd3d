//! AWS Batch entrypoint: one process per submitted extraction job.

use anyhow::Context;
use unzip_pipeline_lambda::adapters::clock::SystemClock;
use unzip_pipeline_lambda::adapters::s3::S3ObjectStore;
use unzip_pipeline_lambda::config::{ProcessEnv, WorkerConfig};
use unzip_pipeline_lambda::handlers::worker::handle_worker_run;
use unzip_pipeline_lambda::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = WorkerConfig::from_env(&ProcessEnv).context("invalid worker configuration")?;
    tracing::info!(
        component = "worker",
        event = "job_started",
        job_id = %config.job_id,
        input_bucket = %config.input_bucket,
        output_bucket = %config.output_bucket,
        run_id = config.run_scope.run_id(),
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let s3_client = aws_sdk_s3::Client::new(&aws_config);
    let input_store = S3ObjectStore::new(config.input_bucket.clone(), s3_client.clone());
    let output_store = S3ObjectStore::new(config.output_bucket.clone(), s3_client.clone());
    let status_store = S3ObjectStore::new(config.status_bucket.clone(), s3_client);

    let report = handle_worker_run(
        &config,
        &input_store,
        &output_store,
        &status_store,
        &SystemClock,
    )
    .with_context(|| format!("extraction job {} failed", config.job_id))?;

    tracing::info!(
        component = "worker",
        event = "job_finished",
        job_id = %report.job_id,
        archives = report.archives.len(),
        uploaded = report.uploaded_file_count(),
    );
    Ok(())
}
