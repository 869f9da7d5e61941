// src/insight/mod.rs
//! Insight requestor: prompt -> one outbound call -> insight text or fixed fallback.
//! Failures never escape; they are logged and replaced by user-visible text.

pub mod client;
pub mod prompt;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{DashboardError, Result};
pub use client::InsightClient;

pub use client::{build_client, DisabledClient, DynInsightClient, GeminiClient, MockClient};
pub use prompt::build_prompt;

/// Shown when the endpoint answers without `candidates[0].content.parts[0].text`.
pub const FALLBACK_UNEXPECTED: &str = "Received an unexpected response from the AI service.";
/// Shown on network errors, non-JSON bodies and disabled generation.
pub const FALLBACK_ERROR: &str = "Error generating insights. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum InsightOutcome {
    Generated(String),
    UnexpectedShape,
    TransportFailure,
}

impl InsightOutcome {
    /// Text stored as the insight.
    pub fn text(&self) -> &str {
        match self {
            InsightOutcome::Generated(t) => t,
            InsightOutcome::UnexpectedShape => FALLBACK_UNEXPECTED,
            InsightOutcome::TransportFailure => FALLBACK_ERROR,
        }
    }

    /// Metric/log label.
    pub fn label(&self) -> &'static str {
        match self {
            InsightOutcome::Generated(_) => "generated",
            InsightOutcome::UnexpectedShape => "unexpected_response",
            InsightOutcome::TransportFailure => "transport_failure",
        }
    }
}

#[derive(Deserialize)]
struct Resp {
    candidates: Vec<Candidate>,
}
#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}
#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}
#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

/// `candidates[0].content.parts[0].text`, if present and non-blank.
pub fn extract_text(body: &Value) -> Result<String> {
    let resp: Resp = serde_json::from_value(body.clone())
        .map_err(|e| DashboardError::UnexpectedResponse(e.to_string()))?;
    let text = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or_else(|| DashboardError::UnexpectedResponse("no generated text segment".into()))?;
    if text.trim().is_empty() {
        return Err(DashboardError::UnexpectedResponse(
            "generated text is empty".into(),
        ));
    }
    Ok(text)
}

/// Classify a client result into the outcome stored as insight.
pub fn classify(result: Result<Value>) -> InsightOutcome {
    match result.and_then(|body| extract_text(&body)) {
        Ok(text) => InsightOutcome::Generated(text),
        Err(e @ DashboardError::UnexpectedResponse(_)) => {
            warn!(error = %e, "insight response had unexpected shape");
            InsightOutcome::UnexpectedShape
        }
        Err(e) => {
            warn!(error = %e, "insight request failed");
            InsightOutcome::TransportFailure
        }
    }
}

/// Exactly one outbound call; no retry.
pub async fn fetch_insight(client: &dyn InsightClient, prompt: &str) -> InsightOutcome {
    let outcome = classify(client.generate(prompt).await);
    info!(
        provider = client.provider_name(),
        outcome = outcome.label(),
        "insight request finished"
    );
    outcome
}
