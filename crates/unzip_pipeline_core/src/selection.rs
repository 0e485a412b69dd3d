use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::contract::{ContractError, DEFAULT_ARCHIVE_BATCH_SIZE};

pub const ARCHIVE_SUFFIXES: [&str; 2] = [".tar.gz", ".tgz"];

/// How many matching archives a single worker invocation processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveBatchSize {
    Limit(NonZeroUsize),
    All,
}

impl Default for ArchiveBatchSize {
    fn default() -> Self {
        match NonZeroUsize::new(DEFAULT_ARCHIVE_BATCH_SIZE) {
            Some(limit) => Self::Limit(limit),
            None => Self::All,
        }
    }
}

impl FromStr for ArchiveBatchSize {
    type Err = ContractError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        if value.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        value
            .parse::<usize>()
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self::Limit)
            .ok_or_else(|| {
                ContractError::validation(format!(
                    "archive batch size must be a positive integer or 'all', got '{value}'"
                ))
            })
    }
}

impl fmt::Display for ArchiveBatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit(limit) => write!(f, "{limit}"),
            Self::All => f.write_str("all"),
        }
    }
}

/// What to do when two extracted files map to the same output key in one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionPolicy {
    #[default]
    Overwrite,
    Fail,
}

impl FromStr for CollisionPolicy {
    type Err = ContractError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "fail" => Ok(Self::Fail),
            other => Err(ContractError::validation(format!(
                "collision policy must be 'overwrite' or 'fail', got '{other}'"
            ))),
        }
    }
}

pub fn is_archive_key(key: &str) -> bool {
    ARCHIVE_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

/// Keeps archive keys in listing order and truncates to the batch size.
pub fn select_archives<'a, I>(keys: I, batch_size: ArchiveBatchSize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let archives = keys.into_iter().filter(|key| is_archive_key(key));
    match batch_size {
        ArchiveBatchSize::Limit(limit) => archives.take(limit.get()).map(str::to_string).collect(),
        ArchiveBatchSize::All => archives.map(str::to_string).collect(),
    }
}

/// Output key for an extracted entry: its base name, directories flattened.
pub fn output_key_for_entry(entry_path: &Path) -> Option<String> {
    entry_path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
