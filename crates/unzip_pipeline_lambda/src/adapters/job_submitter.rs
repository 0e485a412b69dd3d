use serde::{Deserialize, Serialize};

use super::AdapterError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSubmission {
    pub job_name: String,
    pub job_queue: String,
    pub job_definition: String,
    /// Container environment overrides, applied in order.
    pub environment: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmittedJob {
    pub job_id: String,
    pub job_name: String,
    pub job_arn: Option<String>,
}

pub trait JobSubmitter {
    fn submit_job(&self, submission: &JobSubmission) -> Result<SubmittedJob, AdapterError>;
}
