// src/service.rs
//! Dashboard service: wraps the session for concurrent callers, runs the
//! outbound insight call without holding the session lock, and records metrics.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::InsightConfig;
use crate::error::{DashboardError, Result};
use crate::filter::{FilterCriteria, FilterInputs};
use crate::insight::{self, DynInsightClient};
use crate::session::{Completion, Session, SessionSnapshot, StaleResponsePolicy, ViewRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub headers: Vec<String>,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewResponse {
    pub headers: Vec<String>,
    pub total_rows: usize,
    pub rows: Vec<ViewRow>,
}

pub struct DashboardService {
    session: Mutex<Session>,
    client: DynInsightClient,
}

impl DashboardService {
    pub fn new(client: DynInsightClient, stale_policy: StaleResponsePolicy) -> Self {
        Self {
            session: Mutex::new(Session::new(stale_policy)),
            client,
        }
    }

    pub fn from_config(cfg: &InsightConfig) -> Result<Self> {
        let client = insight::build_client(cfg)?;
        info!(
            provider = client.provider_name(),
            enabled = cfg.enabled,
            model = %cfg.model,
            key_len = cfg.api_key.len(),
            "insight client ready"
        );
        Ok(Self::new(client, cfg.stale_policy))
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        // Transitions never leave the session half-updated, so a poisoned lock is still usable.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn provider_name(&self) -> &'static str {
        self.client.provider_name()
    }

    pub fn upload(&self, bytes: &[u8]) -> Result<DatasetInfo> {
        let mut s = self.lock();
        match s.load_csv(bytes) {
            Ok(rows) => {
                counter!("dataset_uploads_total").increment(1);
                counter!("filter_runs_total").increment(1);
                gauge!("dataset_rows").set(rows as f64);
                Ok(DatasetInfo {
                    headers: s.dataset().headers().to_vec(),
                    rows,
                })
            }
            Err(e) => {
                counter!("dataset_parse_errors_total").increment(1);
                warn!(error = %e, bytes = bytes.len(), "upload rejected");
                Err(e)
            }
        }
    }

    pub fn dataset_info(&self) -> DatasetInfo {
        let s = self.lock();
        DatasetInfo {
            headers: s.dataset().headers().to_vec(),
            rows: s.dataset().len(),
        }
    }

    pub fn set_filters(&self, inputs: &FilterInputs) -> SessionSnapshot {
        self.set_criteria(FilterCriteria::from_inputs(inputs))
    }

    pub fn set_criteria(&self, criteria: FilterCriteria) -> SessionSnapshot {
        let mut s = self.lock();
        s.set_criteria(criteria);
        counter!("filter_runs_total").increment(1);
        s.snapshot()
    }

    pub fn view(&self) -> ViewResponse {
        let s = self.lock();
        ViewResponse {
            headers: s.dataset().headers().to_vec(),
            total_rows: s.dataset().len(),
            rows: s.view_rows(),
        }
    }

    pub fn select(&self, row: usize) -> Result<SessionSnapshot> {
        let mut s = self.lock();
        s.select(row)?;
        Ok(s.snapshot())
    }

    pub fn clear_selection(&self) -> SessionSnapshot {
        let mut s = self.lock();
        s.clear_selection();
        s.snapshot()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Request an insight for the current selection.
    ///
    /// Rejected with `InvalidState` when nothing is selected or a request is
    /// already in flight. The call itself runs on a spawned task so the
    /// session always leaves loading, even if the caller goes away.
    pub async fn request_insight(self: &Arc<Self>) -> Result<SessionSnapshot> {
        let ticket = {
            let mut s = self.lock();
            if s.is_loading() {
                return Err(DashboardError::InvalidState(
                    "an insight request is already in flight".into(),
                ));
            }
            s.begin_insight()?
        };

        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            let outcome = insight::fetch_insight(this.client.as_ref(), &ticket.prompt).await;
            counter!("insight_requests_total", "outcome" => outcome.label()).increment(1);
            let row = ticket.row;
            let completion = this.lock().complete_insight(ticket, outcome);
            if completion == Completion::Discarded {
                counter!("insight_stale_discarded_total").increment(1);
                info!(row, "insight arrived after selection changed; dropped");
            }
        });

        if let Err(e) = task.await {
            error!(error = %e, "insight task aborted");
            self.lock().abort_insight();
            return Err(DashboardError::Transport(format!("insight task aborted: {e}")));
        }
        Ok(self.snapshot())
    }
}
