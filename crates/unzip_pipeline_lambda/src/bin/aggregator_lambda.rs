use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use unzip_pipeline_lambda::adapters::s3::S3ObjectStore;
use unzip_pipeline_lambda::config::{AggregatorConfig, ProcessEnv};
use unzip_pipeline_lambda::handlers::aggregator::{
    handle_aggregation, AggregationOutcome, AggregationRequest,
};
use unzip_pipeline_lambda::logging;
use unzip_pipeline_lambda::runtime::contract::validate_run_id;
use unzip_pipeline_lambda::runtime::storage_keys::RunScope;

async fn handle_request(
    event: LambdaEvent<Value>,
    status_store: &S3ObjectStore,
) -> Result<AggregationOutcome, Error> {
    let request = decode_request(event.payload)?;
    let run_id = request
        .run_id
        .as_deref()
        .map(validate_run_id)
        .transpose()?;

    let outcome = handle_aggregation(&RunScope::from_run_id(run_id), status_store)?;
    Ok(outcome)
}

/// Scheduled invocations deliver EventBridge envelopes or `null`; only an
/// explicit `run_id` field changes the scope.
fn decode_request(payload: Value) -> Result<AggregationRequest, Error> {
    match payload {
        Value::Object(_) => serde_json::from_value(payload)
            .map_err(|error| Error::from(format!("invalid aggregation request: {error}"))),
        _ => Ok(AggregationRequest::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init();

    let config = AggregatorConfig::from_env(&ProcessEnv)?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let status_store =
        S3ObjectStore::new(config.status_bucket, aws_sdk_s3::Client::new(&aws_config));

    let status_store = &status_store;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, status_store).await
    }))
    .await
}
