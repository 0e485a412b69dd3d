use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ARCHIVE_BATCH_SIZE: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("{0}")]
    Validation(String),
    #[error("malformed record at '{key}': {message}")]
    MalformedRecord { key: String, message: String },
    #[error("failed to render summary report: {0}")]
    Report(String),
}

impl ContractError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StartRecord {
    pub start_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRecord {
    pub job_id: String,
    pub end_time: f64,
}

/// What the trigger hands back to its invoker after a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub job_name: String,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl StartRecord {
    pub fn new(start_time: f64) -> Result<Self, ContractError> {
        ensure_finite("start_time", start_time)?;
        Ok(Self { start_time })
    }
}

impl CompletionRecord {
    pub fn new(job_id: &str, end_time: f64) -> Result<Self, ContractError> {
        let job_id = validate_job_id(job_id)?;
        ensure_finite("end_time", end_time)?;
        Ok(Self { job_id, end_time })
    }
}

/// Job ids become object key segments, so they must be a single non-empty path segment.
pub fn validate_job_id(raw: &str) -> Result<String, ContractError> {
    let job_id = validate_key_segment("job_id", raw)?;
    // `start_time.json` shares the status prefix with completion records.
    if job_id == "start_time" {
        return Err(ContractError::validation(
            "job_id 'start_time' is reserved for the start record",
        ));
    }
    Ok(job_id)
}

pub fn validate_run_id(raw: &str) -> Result<String, ContractError> {
    validate_key_segment("run_id", raw)
}

fn validate_key_segment(field: &str, raw: &str) -> Result<String, ContractError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ContractError::validation(format!("{field} cannot be empty")));
    }
    if value.contains('/') || value.chars().any(char::is_whitespace) {
        return Err(ContractError::validation(format!(
            "{field} '{value}' must not contain '/' or whitespace"
        )));
    }
    if value == "." || value == ".." {
        return Err(ContractError::validation(format!(
            "{field} '{value}' is not a valid key segment"
        )));
    }
    Ok(value.to_string())
}

fn ensure_finite(field: &str, value: f64) -> Result<(), ContractError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ContractError::validation(format!(
            "{field} must be a finite number of seconds"
        )))
    }
}

pub fn encode_record(record: &impl Serialize) -> Result<Vec<u8>, ContractError> {
    serde_json::to_vec(record).map_err(|error| ContractError::validation(error.to_string()))
}

pub fn decode_record<T: DeserializeOwned>(key: &str, body: &[u8]) -> Result<T, ContractError> {
    serde_json::from_slice(body).map_err(|error| ContractError::MalformedRecord {
        key: key.to_string(),
        message: error.to_string(),
    })
}

/// Decodes a completion record and re-checks the same invariants the writer enforces.
pub fn decode_completion_record(key: &str, body: &[u8]) -> Result<CompletionRecord, ContractError> {
    let record: CompletionRecord = decode_record(key, body)?;
    CompletionRecord::new(&record.job_id, record.end_time).map_err(|error| {
        ContractError::MalformedRecord {
            key: key.to_string(),
            message: error.to_string(),
        }
    })
}

pub fn decode_start_record(key: &str, body: &[u8]) -> Result<StartRecord, ContractError> {
    let record: StartRecord = decode_record(key, body)?;
    StartRecord::new(record.start_time).map_err(|error| ContractError::MalformedRecord {
        key: key.to_string(),
        message: error.to_string(),
    })
}
