// src/insight/prompt.rs
//! Natural-language prompt for one campaign row.

use std::fmt::Write as _;

use crate::model::{CampaignRecord, MetricField};

const PREAMBLE: &str = "Analyze the following email campaign metrics and provide \
actionable insights: what is working, what is underperforming, and concrete \
recommendations to improve engagement and deliverability.";

/// Name plus all nine metrics as `<label>: <value>` lines; rates get `%`.
/// Metrics whose column was not uploaded render as `N/A`.
pub fn build_prompt(record: &CampaignRecord) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(PREAMBLE);
    out.push_str("\n\n");
    let _ = writeln!(out, "Email Name: {}", record.display_name());
    for field in MetricField::ALL {
        let value = match record.metric(field) {
            Some(v) if field.is_rate() => format!("{v}%"),
            Some(v) => v.to_string(),
            None => "N/A".to_string(),
        };
        let _ = writeln!(out, "{}: {}", field.label(), value);
    }
    out
}
