use serde::{Deserialize, Serialize};

use crate::contract::{CompletionRecord, ContractError, StartRecord};

pub const SUMMARY_HEADER: [&str; 3] = ["Start_Time", "End_Time", "Total_Time"];
const NULL_FIELD: &str = "null";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimingSummary {
    pub start_time: f64,
    pub end_time: Option<f64>,
    pub total_time: Option<f64>,
}

/// Elapsed time from the start record to the latest completion record.
///
/// With no completion records the end and total are `None` rather than an error.
pub fn summarize(start: &StartRecord, completions: &[CompletionRecord]) -> TimingSummary {
    let end_time = completions
        .iter()
        .map(|record| record.end_time)
        .reduce(f64::max);

    TimingSummary {
        start_time: start.start_time,
        end_time,
        total_time: end_time.map(|end| end - start.start_time),
    }
}

pub fn render_summary_csv(summary: &TimingSummary) -> Result<Vec<u8>, ContractError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(SUMMARY_HEADER)
        .map_err(|error| ContractError::Report(error.to_string()))?;
    writer
        .write_record([
            format_seconds(summary.start_time),
            summary.end_time.map_or_else(|| NULL_FIELD.to_string(), format_seconds),
            summary.total_time.map_or_else(|| NULL_FIELD.to_string(), format_seconds),
        ])
        .map_err(|error| ContractError::Report(error.to_string()))?;

    writer
        .into_inner()
        .map_err(|error| ContractError::Report(error.to_string()))
}

/// Shortest round-trip form, always carrying a fractional part (`100.0`).
pub fn format_seconds(value: f64) -> String {
    format!("{value:?}")
}
