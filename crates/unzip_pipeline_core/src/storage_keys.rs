use serde::{Deserialize, Serialize};

pub const STATUS_PREFIX: &str = "unzip_status";
pub const START_RECORD_NAME: &str = "start_time.json";
pub const LEGACY_SUMMARY_KEY: &str = "unzip_results.csv";
const RUNS_SEGMENT: &str = "runs";
const SUMMARY_PREFIX: &str = "unzip_results";

/// Namespace the status records and summary report live in.
///
/// `Legacy` reproduces the fixed, run-less key layout; `Run` isolates every
/// pipeline run under its own prefix so concurrent runs cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunScope {
    Legacy,
    Run(String),
}

impl RunScope {
    pub fn from_run_id(run_id: Option<String>) -> Self {
        match run_id {
            Some(run_id) => Self::Run(run_id),
            None => Self::Legacy,
        }
    }

    pub fn run_id(&self) -> Option<&str> {
        match self {
            Self::Legacy => None,
            Self::Run(run_id) => Some(run_id),
        }
    }
}

/// Prefix (with trailing slash) under which start and completion records are stored.
pub fn status_prefix(scope: &RunScope) -> String {
    match scope {
        RunScope::Legacy => format!("{STATUS_PREFIX}/"),
        RunScope::Run(run_id) => format!("{STATUS_PREFIX}/{RUNS_SEGMENT}/{run_id}/"),
    }
}

pub fn start_record_key(scope: &RunScope) -> String {
    format!("{}{START_RECORD_NAME}", status_prefix(scope))
}

pub fn completion_record_key(scope: &RunScope, job_id: &str) -> String {
    format!("{}{job_id}.json", status_prefix(scope))
}

pub fn summary_report_key(scope: &RunScope) -> String {
    match scope {
        RunScope::Legacy => LEGACY_SUMMARY_KEY.to_string(),
        RunScope::Run(run_id) => format!("{SUMMARY_PREFIX}/{run_id}.csv"),
    }
}

/// Returns the job id when `key` is a completion record of `scope`.
///
/// Only direct children of the status prefix count; the start record and
/// anything nested deeper (other run scopes) are skipped.
pub fn completion_record_job_id<'a>(scope: &RunScope, key: &'a str) -> Option<&'a str> {
    let prefix = status_prefix(scope);
    let name = key.strip_prefix(prefix.as_str())?;
    if name.contains('/') || name == START_RECORD_NAME {
        return None;
    }
    let job_id = name.strip_suffix(".json")?;
    if job_id.is_empty() {
        return None;
    }
    Some(job_id)
}
