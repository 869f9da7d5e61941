// src/error.rs
//! Error taxonomy shared by the ingest pipeline, the session and the insight requestor.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// Malformed CSV upload. The prior dataset stays in place.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Operation invoked without its precondition (e.g. no selection).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Network / protocol failure talking to the text-generation endpoint.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Endpoint answered, but not with `candidates[0].content.parts[0].text`.
    #[error("Unexpected response shape: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    /// Stable machine-readable kind, used in JSON error bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Parse(_) => "parse_error",
            DashboardError::InvalidState(_) => "invalid_state",
            DashboardError::Transport(_) => "transport_failure",
            DashboardError::UnexpectedResponse(_) => "unexpected_response",
            DashboardError::Config(_) => "config_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
