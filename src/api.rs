// src/api.rs
//! HTTP surface consumed by the browser dashboard.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::config::InsightConfig;
use crate::error::DashboardError;
use crate::filter::{FilterCriteria, FilterInputs};
use crate::model::RowId;
use crate::service::{DashboardService, DatasetInfo, ViewResponse};
use crate::session::SessionSnapshot;

/// Uploads above this size are rejected before parsing.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DashboardService>,
}

impl AppState {
    pub fn new(service: DashboardService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Insight config from `INSIGHT_CONFIG_PATH` / `config/insight.*` / defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let cfg = InsightConfig::load_default()?;
        Ok(Self::new(DashboardService::from_config(&cfg)?))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/dataset", post(upload_dataset).get(dataset_info))
        .route("/filters", get(get_filters).put(set_filters))
        .route("/view", get(view))
        .route("/selection", post(select_row).delete(clear_selection))
        .route("/insight", post(request_insight))
        .route("/state", get(snapshot))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::Parse(_) => StatusCode::BAD_REQUEST,
            DashboardError::InvalidState(_) => StatusCode::CONFLICT,
            DashboardError::Transport(_) | DashboardError::UnexpectedResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            DashboardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn upload_dataset(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DatasetInfo>, DashboardError> {
    state.service.upload(&body).map(Json)
}

async fn dataset_info(State(state): State<AppState>) -> Json<DatasetInfo> {
    Json(state.service.dataset_info())
}

async fn get_filters(State(state): State<AppState>) -> Json<FilterCriteria> {
    Json(state.service.snapshot().criteria)
}

async fn set_filters(
    State(state): State<AppState>,
    Json(inputs): Json<FilterInputs>,
) -> Json<SessionSnapshot> {
    Json(state.service.set_filters(&inputs))
}

async fn view(State(state): State<AppState>) -> Json<ViewResponse> {
    Json(state.service.view())
}

#[derive(Deserialize)]
struct SelectReq {
    row: RowId,
}

async fn select_row(
    State(state): State<AppState>,
    Json(body): Json<SelectReq>,
) -> Result<Json<SessionSnapshot>, DashboardError> {
    state.service.select(body.row).map(Json)
}

async fn clear_selection(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.service.clear_selection())
}

async fn request_insight(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, DashboardError> {
    state.service.request_insight().await.map(Json)
}

async fn snapshot(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.service.snapshot())
}
