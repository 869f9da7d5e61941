// src/session.rs
//! Dashboard session: the single owner of dataset, criteria, view, selection
//! and insight, with explicit transition functions.
//!
//! Every transition is synchronous. The only suspension point (the outbound
//! insight call) sits between `begin_insight` and `complete_insight`, so the
//! caller never holds the session across an await.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::debug::anon_hash;
use crate::error::{DashboardError, Result};
use crate::filter::{self, FilterCriteria, FilteredView};
use crate::ingest;
use crate::insight::{build_prompt, InsightOutcome};
use crate::model::{Dataset, FieldValue, RowId};

/// What happens to an insight response whose originating selection is gone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleResponsePolicy {
    /// Drop it; the current selection never shows another row's insight.
    #[default]
    Discard,
    /// Store it anyway (unguarded behaviour).
    Apply,
}

/// Issued by `begin_insight`, redeemed by `complete_insight`.
#[derive(Debug, Clone)]
pub struct InsightTicket {
    pub row: RowId,
    pub record_name: String,
    pub prompt: String,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    /// Row selected when the request was issued.
    pub row: RowId,
    pub record_name: String,
    pub text: String,
    pub outcome: &'static str,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Stored,
    Discarded,
}

/// One table row of the filtered view, cells in header order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    pub id: RowId,
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub total_rows: usize,
    pub visible_rows: usize,
    pub criteria: FilterCriteria,
    pub selection: Option<RowId>,
    pub loading: bool,
    pub insight: Option<Insight>,
}

#[derive(Debug, Default)]
pub struct Session {
    dataset: Arc<Dataset>,
    criteria: FilterCriteria,
    view: FilteredView,
    selection: Option<RowId>,
    insight: Option<Insight>,
    loading: bool,
    /// Bumped whenever selection changes; tickets from older generations are stale.
    generation: u64,
    stale_policy: StaleResponsePolicy,
}

impl Session {
    pub fn new(stale_policy: StaleResponsePolicy) -> Self {
        Self {
            stale_policy,
            ..Default::default()
        }
    }

    // ---- accessors ----

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    pub fn selection(&self) -> Option<RowId> {
        self.selection
    }

    pub fn insight(&self) -> Option<&Insight> {
        self.insight.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn view_rows(&self) -> Vec<ViewRow> {
        self.view
            .rows()
            .iter()
            .filter_map(|id| self.dataset.get(*id))
            .map(|rec| ViewRow {
                id: rec.id,
                values: self.dataset.row_values(rec),
            })
            .collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            total_rows: self.dataset.len(),
            visible_rows: self.view.len(),
            criteria: self.criteria.clone(),
            selection: self.selection,
            loading: self.loading,
            insight: self.insight.clone(),
        }
    }

    // ---- transitions ----

    /// Parse + normalize an upload. On error nothing changes.
    pub fn load_csv(&mut self, bytes: &[u8]) -> Result<usize> {
        let dataset = ingest::ingest_csv(bytes)?;
        let rows = dataset.len();
        self.replace_dataset(dataset);
        Ok(rows)
    }

    /// Swap in a new dataset wholesale; criteria are kept and re-applied.
    pub fn replace_dataset(&mut self, dataset: Dataset) {
        info!(
            rows = dataset.len(),
            columns = dataset.headers().len(),
            "dataset replaced"
        );
        self.dataset = Arc::new(dataset);
        self.refilter();
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.refilter();
    }

    /// Recompute the view. Selection and insight are cleared unconditionally.
    fn refilter(&mut self) {
        self.view = filter::apply(&self.dataset, &self.criteria);
        self.reset_selection();
        debug!(
            visible = self.view.len(),
            total = self.dataset.len(),
            unconstrained = self.criteria.is_unconstrained(),
            "filtered view recomputed"
        );
    }

    fn reset_selection(&mut self) {
        self.selection = None;
        self.insight = None;
        self.generation += 1;
    }

    /// Select a row of the current view; clears any insight.
    pub fn select(&mut self, row: RowId) -> Result<()> {
        if !self.view.contains(row) {
            return Err(DashboardError::InvalidState(format!(
                "row {row} is not in the current view"
            )));
        }
        self.reset_selection();
        self.selection = Some(row);
        if let Some(rec) = self.dataset.get(row) {
            debug!(row, id = %anon_hash(rec.display_name()), "row selected");
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.reset_selection();
    }

    /// Enter loading and build the prompt for the selected record.
    pub fn begin_insight(&mut self) -> Result<InsightTicket> {
        let row = self
            .selection
            .ok_or_else(|| DashboardError::InvalidState("select a row first".into()))?;
        let record = self.dataset.get(row).ok_or_else(|| {
            DashboardError::InvalidState(format!("row {row} is not in the dataset"))
        })?;

        let ticket = InsightTicket {
            row,
            record_name: record.display_name().to_string(),
            prompt: build_prompt(record),
            generation: self.generation,
        };
        self.insight = None;
        self.loading = true;
        Ok(ticket)
    }

    /// Leave loading without an outcome (the request task died).
    pub fn abort_insight(&mut self) {
        self.loading = false;
    }

    /// Always leaves loading. Stale tickets are dropped under `Discard`.
    pub fn complete_insight(&mut self, ticket: InsightTicket, outcome: InsightOutcome) -> Completion {
        self.loading = false;

        let stale = ticket.generation != self.generation;
        if stale && self.stale_policy == StaleResponsePolicy::Discard {
            debug!(
                row = ticket.row,
                outcome = outcome.label(),
                "stale insight response discarded"
            );
            return Completion::Discarded;
        }

        self.insight = Some(Insight {
            row: ticket.row,
            record_name: ticket.record_name,
            text: outcome.text().to_string(),
            outcome: outcome.label(),
            completed_at: Utc::now(),
        });
        Completion::Stored
    }
}
