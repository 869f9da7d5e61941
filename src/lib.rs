// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod debug;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod insight;
pub mod metrics;
pub mod model;
pub mod service;
pub mod session;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::DashboardError;
pub use crate::filter::{FilterCriteria, FilterInputs, FilteredView};
pub use crate::model::{CampaignRecord, Dataset, FieldValue, MetricField, RowId};
pub use crate::service::DashboardService;
pub use crate::session::{Session, StaleResponsePolicy};

use tracing::info;

/// Build the full application router (API + `/metrics`) from env/config files.
///
/// Installs the global Prometheus recorder, so call it once per process.
pub fn app() -> anyhow::Result<axum::Router> {
    let state = AppState::from_env()?;
    let metrics = metrics::Metrics::init()?;
    info!(provider = state.service.provider_name(), "campaign insights app built");
    Ok(router(state).merge(metrics.router()))
}
