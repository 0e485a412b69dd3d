//! Typed runtime configuration read from environment variables.

use std::collections::BTreeMap;

use thiserror::Error;
use unzip_pipeline_core::contract::{validate_job_id, validate_run_id};
use unzip_pipeline_core::selection::{ArchiveBatchSize, CollisionPolicy};
use unzip_pipeline_core::storage_keys::RunScope;

pub const STATUS_BUCKET_VAR: &str = "UNZIP_STATUS_BUCKET";
pub const JOB_NAME_VAR: &str = "UNZIP_JOB_NAME";
pub const JOB_QUEUE_VAR: &str = "UNZIP_JOB_QUEUE";
pub const JOB_DEFINITION_VAR: &str = "UNZIP_JOB_DEFINITION";
pub const RUN_SCOPED_VAR: &str = "UNZIP_RUN_SCOPED";
pub const RUN_ID_VAR: &str = "UNZIP_RUN_ID";
pub const INPUT_BUCKET_VAR: &str = "UNZIP_INPUT_BUCKET";
pub const OUTPUT_BUCKET_VAR: &str = "UNZIP_OUTPUT_BUCKET";
pub const JOB_ID_OVERRIDE_VAR: &str = "UNZIP_JOB_ID";
/// Set by AWS Batch inside every job container.
pub const BATCH_JOB_ID_VAR: &str = "AWS_BATCH_JOB_ID";
pub const ARCHIVE_BATCH_SIZE_VAR: &str = "UNZIP_ARCHIVE_BATCH_SIZE";
pub const ON_COLLISION_VAR: &str = "UNZIP_ON_COLLISION";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{name} is invalid: {message}")]
    Invalid { name: &'static str, message: String },
}

pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerConfig {
    pub status_bucket: String,
    pub job_name: String,
    pub job_queue: String,
    pub job_definition: String,
    pub run_scoped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub input_bucket: String,
    pub output_bucket: String,
    pub status_bucket: String,
    pub job_id: String,
    pub run_scope: RunScope,
    pub batch_size: ArchiveBatchSize,
    pub collision_policy: CollisionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub status_bucket: String,
}

impl TriggerConfig {
    pub fn from_env(env: &impl EnvSource) -> Result<Self, ConfigError> {
        Ok(Self {
            status_bucket: required(env, STATUS_BUCKET_VAR)?,
            job_name: required(env, JOB_NAME_VAR)?,
            job_queue: required(env, JOB_QUEUE_VAR)?,
            job_definition: required(env, JOB_DEFINITION_VAR)?,
            run_scoped: optional(env, RUN_SCOPED_VAR)
                .map(|raw| parse_bool(RUN_SCOPED_VAR, &raw))
                .transpose()?
                .unwrap_or(false),
        })
    }
}

impl WorkerConfig {
    pub fn from_env(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let raw_job_id = optional(env, JOB_ID_OVERRIDE_VAR)
            .or_else(|| optional(env, BATCH_JOB_ID_VAR))
            .ok_or(ConfigError::Missing(BATCH_JOB_ID_VAR))?;
        let job_id = validate_job_id(&raw_job_id).map_err(|error| ConfigError::Invalid {
            name: BATCH_JOB_ID_VAR,
            message: error.to_string(),
        })?;

        let run_id = optional(env, RUN_ID_VAR)
            .map(|raw| {
                validate_run_id(&raw).map_err(|error| ConfigError::Invalid {
                    name: RUN_ID_VAR,
                    message: error.to_string(),
                })
            })
            .transpose()?;

        let output_bucket = required(env, OUTPUT_BUCKET_VAR)?;
        let status_bucket =
            optional(env, STATUS_BUCKET_VAR).unwrap_or_else(|| output_bucket.clone());

        Ok(Self {
            input_bucket: required(env, INPUT_BUCKET_VAR)?,
            output_bucket,
            status_bucket,
            job_id,
            run_scope: RunScope::from_run_id(run_id),
            batch_size: parse_optional(env, ARCHIVE_BATCH_SIZE_VAR)?.unwrap_or_default(),
            collision_policy: parse_optional(env, ON_COLLISION_VAR)?.unwrap_or_default(),
        })
    }
}

impl AggregatorConfig {
    pub fn from_env(env: &impl EnvSource) -> Result<Self, ConfigError> {
        Ok(Self {
            status_bucket: required(env, STATUS_BUCKET_VAR)?,
        })
    }
}

/// Unset and blank values are treated the same.
fn optional(env: &impl EnvSource, name: &'static str) -> Option<String> {
    env.var(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(env: &impl EnvSource, name: &'static str) -> Result<String, ConfigError> {
    optional(env, name).ok_or(ConfigError::Missing(name))
}

fn parse_optional<T>(env: &impl EnvSource, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional(env, name)
        .map(|raw| {
            raw.parse::<T>().map_err(|error| ConfigError::Invalid {
                name,
                message: error.to_string(),
            })
        })
        .transpose()
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}
