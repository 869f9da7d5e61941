// src/filter.rs
//! Filter engine: a conjunction of optional constraints evaluated as ordered,
//! independent passes over a narrowing candidate set.

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{CampaignRecord, Dataset, MetricField, RowId};

/// Active constraints. `None` means "no constraint", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub name_query: Option<String>,
    pub min_open_rate: Option<f64>,
    pub max_open_rate: Option<f64>,
    pub min_click_rate: Option<f64>,
    pub max_click_rate: Option<f64>,
}

/// The five raw form inputs, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterInputs {
    #[serde(deserialize_with = "text_or_number")]
    pub search: String,
    #[serde(deserialize_with = "text_or_number")]
    pub min_open_rate: String,
    #[serde(deserialize_with = "text_or_number")]
    pub max_open_rate: String,
    #[serde(deserialize_with = "text_or_number")]
    pub min_click_rate: String,
    #[serde(deserialize_with = "text_or_number")]
    pub max_click_rate: String,
}

/// Form fields may arrive as JSON strings, numbers or null.
fn text_or_number<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }
    Ok(match Option::<Raw>::deserialize(de)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

/// Empty, non-numeric or non-finite text is an absent bound.
fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl FilterCriteria {
    pub fn from_inputs(inputs: &FilterInputs) -> Self {
        Self {
            name_query: Some(inputs.search.clone()).filter(|s| !s.is_empty()),
            min_open_rate: parse_bound(&inputs.min_open_rate),
            max_open_rate: parse_bound(&inputs.max_open_rate),
            min_click_rate: parse_bound(&inputs.min_click_rate),
            max_click_rate: parse_bound(&inputs.max_click_rate),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.name_query.as_deref().map_or(true, str::is_empty)
            && self.min_open_rate.is_none()
            && self.max_open_rate.is_none()
            && self.min_click_rate.is_none()
            && self.max_click_rate.is_none()
    }
}

/// Ordered subsequence of dataset row ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilteredView {
    rows: Vec<RowId>,
}

impl FilteredView {
    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    pub fn contains(&self, id: RowId) -> bool {
        // rows are strictly increasing
        self.rows.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn name_matches(record: &CampaignRecord, needle_lower: &str) -> bool {
    match record.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_lowercase().contains(needle_lower),
        _ => false,
    }
}

fn bound_pass(
    candidates: &mut Vec<&CampaignRecord>,
    field: MetricField,
    bound: Option<f64>,
    keep: impl Fn(f64, f64) -> bool,
) {
    if let Some(b) = bound {
        // A record without the column cannot satisfy an active bound.
        candidates.retain(|r| r.metric(field).is_some_and(|v| keep(v, b)));
    }
}

/// Total and idempotent; never reorders.
pub fn apply(dataset: &Dataset, criteria: &FilterCriteria) -> FilteredView {
    if criteria.is_unconstrained() {
        return FilteredView {
            rows: dataset.records().iter().map(|r| r.id).collect(),
        };
    }
    let mut candidates: Vec<&CampaignRecord> = dataset.records().iter().collect();

    if let Some(q) = criteria.name_query.as_deref().filter(|q| !q.is_empty()) {
        let needle = q.to_lowercase();
        candidates.retain(|r| name_matches(r, &needle));
    }
    bound_pass(&mut candidates, MetricField::OpenRate, criteria.min_open_rate, |v, b| v >= b);
    bound_pass(&mut candidates, MetricField::OpenRate, criteria.max_open_rate, |v, b| v <= b);
    bound_pass(&mut candidates, MetricField::ClickRate, criteria.min_click_rate, |v, b| v >= b);
    bound_pass(&mut candidates, MetricField::ClickRate, criteria.max_click_rate, |v, b| v <= b);

    FilteredView {
        rows: candidates.into_iter().map(|r| r.id).collect(),
    }
}
