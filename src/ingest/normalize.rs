// src/ingest/normalize.rs
//! Metric normalizer: turns raw string rows into typed records.
//!
//! Coercion is deliberately lenient: a malformed metric cell is
//! indistinguishable from a true zero.

use super::RawTable;
use crate::model::{CampaignRecord, Dataset, MetricField, NAME_HEADER};
use std::collections::BTreeMap;

/// Coerce one metric cell. Empty, unparsable or non-finite text -> `0.0`.
/// A single trailing `%` is accepted ("25.5%" -> 25.5).
pub fn coerce_metric(raw: &str) -> f64 {
    let s = raw.trim();
    let s = s.strip_suffix('%').map(str::trim_end).unwrap_or(s);
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Column role, resolved once per header.
#[derive(Debug, Clone, Copy)]
enum Column {
    Name,
    Metric(MetricField),
    Extra,
}

fn classify(header: &str) -> Column {
    if header == NAME_HEADER {
        Column::Name
    } else if let Some(field) = MetricField::from_header(header) {
        Column::Metric(field)
    } else {
        Column::Extra
    }
}

/// Pure; runs once per ingested file. Row order becomes `RowId` order.
pub fn normalize(table: RawTable) -> Dataset {
    let RawTable { headers, rows } = table;
    let columns: Vec<Column> = headers.iter().map(|h| classify(h)).collect();

    let records = rows
        .into_iter()
        .enumerate()
        .map(|(id, cells)| {
            let mut name = None;
            let mut metrics = BTreeMap::new();
            let mut extra = BTreeMap::new();
            for ((column, header), cell) in columns.iter().zip(&headers).zip(cells) {
                match column {
                    Column::Name => name = Some(cell),
                    Column::Metric(field) => {
                        metrics.insert(*field, coerce_metric(&cell));
                    }
                    Column::Extra => {
                        extra.insert(header.clone(), cell);
                    }
                }
            }
            CampaignRecord {
                id,
                name,
                metrics,
                extra,
            }
        })
        .collect();

    Dataset::new(headers, records)
}
