//! Parse source-file lines into [`Record`]s.
//!
//! Two line shapes are recognized: a line whose trimmed form begins with
//! `{` is parsed as a self-describing JSON object; anything else is split
//! on comma or tab and wrapped as a generic delimited record. Blank lines
//! are the caller's concern (see [`is_blank`]).

use serde_json::{Map, Value};

use filepipe_core::Record;

use crate::error::QueueError;

/// Whether the line is blank or whitespace-only (skipped by the pipeline).
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Parse a single non-blank line into a [`Record`].
///
/// `position` is the 1-based physical line number; it is carried into the
/// wrapper body for delimited lines and into parse errors either way.
pub fn parse_line(
    file_id: &str,
    file_name: &str,
    line: &str,
    position: u64,
) -> Result<Record, QueueError> {
    let trimmed = line.trim();
    if trimmed.starts_with('{') {
        let body: Map<String, Value> = serde_json::from_str(trimmed)
            .map_err(|e| QueueError::Parse(format!("invalid JSON: {}", e)))?;
        Ok(Record::structured(file_id, file_name, body))
    } else {
        let parts: Vec<&str> = line.split(['\t', ',']).collect();
        Ok(Record::delimited(file_id, file_name, line, parts, position))
    }
}
