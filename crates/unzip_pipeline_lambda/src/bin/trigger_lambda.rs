use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use unzip_pipeline_lambda::adapters::batch::AwsBatchSubmitter;
use unzip_pipeline_lambda::adapters::clock::SystemClock;
use unzip_pipeline_lambda::adapters::s3::S3ObjectStore;
use unzip_pipeline_lambda::config::{ProcessEnv, TriggerConfig};
use unzip_pipeline_lambda::handlers::trigger::{handle_trigger, new_run_scope};
use unzip_pipeline_lambda::logging;
use unzip_pipeline_lambda::runtime::contract::SubmissionResponse;

struct TriggerDependencies {
    config: TriggerConfig,
    status_store: S3ObjectStore,
    submitter: AwsBatchSubmitter,
}

/// The event payload carries no parameters; every invocation starts one run.
async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &TriggerDependencies,
) -> Result<SubmissionResponse, Error> {
    tracing::info!(
        component = "trigger",
        event = "invoked",
        request_id = %event.context.request_id,
    );
    let scope = new_run_scope(&deps.config);
    let response = handle_trigger(
        &deps.config,
        &scope,
        &deps.status_store,
        &deps.submitter,
        &SystemClock,
    )?;
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init();

    let config = TriggerConfig::from_env(&ProcessEnv)?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = TriggerDependencies {
        status_store: S3ObjectStore::new(
            config.status_bucket.clone(),
            aws_sdk_s3::Client::new(&aws_config),
        ),
        submitter: AwsBatchSubmitter::new(aws_sdk_batch::Client::new(&aws_config)),
        config,
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, deps).await
    }))
    .await
}
