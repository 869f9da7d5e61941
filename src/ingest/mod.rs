// src/ingest/mod.rs
//! CSV ingestion: raw upload bytes -> header + string rows -> typed `Dataset`.

pub mod normalize;

use crate::error::{DashboardError, Result};
use crate::model::Dataset;
use std::collections::HashSet;

/// Header and data rows exactly as read from the file (blank lines dropped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse an uploaded CSV file. The first non-blank line is the header.
///
/// Comma-delimited UTF-8 only; a leading BOM is tolerated. A data row whose
/// field count differs from the header fails the whole file.
pub fn parse_csv(bytes: &[u8]) -> Result<RawTable> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DashboardError::Parse(format!("file is not valid UTF-8: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record =
            result.map_err(|e| DashboardError::Parse(format!("malformed CSV: {e}")))?;
        if is_blank(&record) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        match &headers {
            None => headers = Some(validate_headers(&record)?),
            Some(h) => {
                if record.len() != h.len() {
                    return Err(DashboardError::Parse(format!(
                        "line {line}: expected {} fields, found {}",
                        h.len(),
                        record.len()
                    )));
                }
                rows.push(record.iter().map(str::to_string).collect());
            }
        }
    }

    let headers = headers
        .ok_or_else(|| DashboardError::Parse("file is empty: missing header row".into()))?;
    tracing::debug!(columns = headers.len(), rows = rows.len(), "csv parsed");
    Ok(RawTable { headers, rows })
}

/// Parse + normalize in one step.
pub fn ingest_csv(bytes: &[u8]) -> Result<Dataset> {
    let table = parse_csv(bytes)?;
    Ok(normalize::normalize(table))
}

/// A line with no content. `,,` is a row of empty cells, not a blank line.
fn is_blank(record: &csv::StringRecord) -> bool {
    record.len() <= 1 && record.iter().all(|f| f.trim().is_empty())
}

fn validate_headers(record: &csv::StringRecord) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(record.len());
    for (idx, raw) in record.iter().enumerate() {
        let name = raw.trim();
        if name.is_empty() {
            return Err(DashboardError::Parse(format!(
                "header column {} has no name",
                idx + 1
            )));
        }
        if !seen.insert(name.to_string()) {
            return Err(DashboardError::Parse(format!(
                "duplicate header column '{name}'"
            )));
        }
        out.push(name.to_string());
    }
    Ok(out)
}
