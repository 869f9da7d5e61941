// src/model.rs
//! Typed campaign records and the immutable dataset they live in.
//!
//! A record keeps the fixed metric catalogue as numbers and every other
//! column as opaque text, so arbitrary extra columns pass through untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column holding the campaign's display name (searched by the name filter).
pub const NAME_HEADER: &str = "Email Name";

/// Stable synthetic key of a record: its zero-based position in the dataset.
pub type RowId = usize;

/// The nine metric columns coerced to numbers on ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Sent,
    Delivered,
    OpenRate,
    ClickRate,
    HardBounceRate,
    UnsubscribeRate,
    BounceRate,
    SpamRate,
    DeliveryRate,
}

impl MetricField {
    /// Prompt order.
    pub const ALL: [MetricField; 9] = [
        MetricField::Sent,
        MetricField::Delivered,
        MetricField::OpenRate,
        MetricField::ClickRate,
        MetricField::HardBounceRate,
        MetricField::UnsubscribeRate,
        MetricField::BounceRate,
        MetricField::SpamRate,
        MetricField::DeliveryRate,
    ];

    /// Exact CSV header of the column.
    pub fn header(&self) -> &'static str {
        match self {
            MetricField::Sent => "Sent",
            MetricField::Delivered => "Delivered",
            MetricField::OpenRate => "Open Rate",
            MetricField::ClickRate => "Click Rate",
            MetricField::HardBounceRate => "Hard Bounce Rate",
            MetricField::UnsubscribeRate => "Unsubscribe Rate",
            MetricField::BounceRate => "Bounce Rate",
            MetricField::SpamRate => "Spam Rate",
            MetricField::DeliveryRate => "Delivery Rate",
        }
    }

    /// Human label used when rendering the analysis prompt.
    pub fn label(&self) -> &'static str {
        match self {
            MetricField::Sent => "Emails Sent",
            MetricField::Delivered => "Emails Delivered",
            MetricField::OpenRate => "Open Rate",
            MetricField::ClickRate => "Click Rate",
            MetricField::HardBounceRate => "Hard Bounce Rate",
            MetricField::UnsubscribeRate => "Unsubscribe Rate",
            MetricField::BounceRate => "Bounce Rate",
            MetricField::SpamRate => "Spam Rate",
            MetricField::DeliveryRate => "Delivery Rate",
        }
    }

    /// Rates render with a `%` suffix; counts don't.
    pub fn is_rate(&self) -> bool {
        !matches!(self, MetricField::Sent | MetricField::Delivered)
    }

    pub fn from_header(header: &str) -> Option<Self> {
        let h = header.trim();
        Self::ALL.iter().copied().find(|f| f.header() == h)
    }
}

/// A single cell as exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

/// One email campaign's metrics row.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignRecord {
    pub id: RowId,
    /// `None` when the header has no name column.
    pub name: Option<String>,
    /// Only metrics whose column exists in the header.
    pub metrics: BTreeMap<MetricField, f64>,
    /// Every other column, verbatim.
    pub extra: BTreeMap<String, String>,
}

impl CampaignRecord {
    pub fn metric(&self, field: MetricField) -> Option<f64> {
        self.metrics.get(&field).copied()
    }

    /// Lookup by CSV header name.
    pub fn get(&self, header: &str) -> Option<FieldValue> {
        let header = header.trim();
        if header == NAME_HEADER {
            return self.name.clone().map(FieldValue::Text);
        }
        if let Some(field) = MetricField::from_header(header) {
            return self.metric(field).map(FieldValue::Number);
        }
        self.extra.get(header).cloned().map(FieldValue::Text)
    }

    /// Name used in prompts and logs; blank when the column is missing.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Ordered, immutable set of records sharing one header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<CampaignRecord>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, records: Vec<CampaignRecord>) -> Self {
        Self { headers, records }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[CampaignRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RowId) -> Option<&CampaignRecord> {
        self.records.get(id)
    }

    /// Cells of `record` in header order (table row).
    pub fn row_values(&self, record: &CampaignRecord) -> Vec<FieldValue> {
        self.headers
            .iter()
            .map(|h| record.get(h).unwrap_or(FieldValue::Text(String::new())))
            .collect()
    }
}
