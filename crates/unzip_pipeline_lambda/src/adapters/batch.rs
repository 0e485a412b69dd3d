use aws_sdk_batch::operation::submit_job::SubmitJobOutput;
use aws_sdk_batch::types::{ContainerOverrides, KeyValuePair};

use super::job_submitter::{JobSubmission, JobSubmitter, SubmittedJob};
use super::AdapterError;

#[derive(Debug, Clone)]
pub struct AwsBatchSubmitter {
    batch_client: aws_sdk_batch::Client,
}

impl AwsBatchSubmitter {
    pub fn new(batch_client: aws_sdk_batch::Client) -> Self {
        Self { batch_client }
    }
}

impl JobSubmitter for AwsBatchSubmitter {
    fn submit_job(&self, submission: &JobSubmission) -> Result<SubmittedJob, AdapterError> {
        let client = self.batch_client.clone();
        let submission = submission.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let requested_name = submission.job_name.clone();
                let mut request = client
                    .submit_job()
                    .job_name(submission.job_name)
                    .job_queue(submission.job_queue)
                    .job_definition(submission.job_definition);

                if !submission.environment.is_empty() {
                    let overrides = submission
                        .environment
                        .into_iter()
                        .fold(ContainerOverrides::builder(), |builder, (name, value)| {
                            builder.environment(
                                KeyValuePair::builder().name(name).value(value).build(),
                            )
                        })
                        .build();
                    request = request.container_overrides(overrides);
                }

                let output = request
                    .send()
                    .await
                    .map_err(|error| AdapterError::Submission(error.to_string()))?;
                submitted_job_from_output(&output, &requested_name)
            })
        })
    }
}

/// A response without `jobId` is a failed submission; a missing `jobName`
/// falls back to the name that was requested.
fn submitted_job_from_output(
    output: &SubmitJobOutput,
    requested_name: &str,
) -> Result<SubmittedJob, AdapterError> {
    let job_id = output
        .job_id()
        .filter(|job_id| !job_id.is_empty())
        .ok_or_else(|| AdapterError::Submission("SubmitJob response missing jobId".into()))?;

    Ok(SubmittedJob {
        job_id: job_id.to_string(),
        job_name: output.job_name().unwrap_or(requested_name).to_string(),
        job_arn: output.job_arn().map(str::to_string),
    })
}
