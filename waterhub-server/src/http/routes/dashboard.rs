//! Dashboard endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db::DashboardTotals;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{Event, Pagination, Transaction};

/// Rows shown per feed on the dashboard
const ACTIVITY_LIMIT: u32 = 10;

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub transactions: Vec<Transaction>,
    pub events: Vec<Event>,
}

/// GET /api/dashboard/stats
async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<DashboardTotals>, ApiError> {
    let totals = state.store.dashboard_totals().await?;
    Ok(Json(totals))
}

/// GET /api/dashboard/activity
async fn activity(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let page = Pagination::first(ACTIVITY_LIMIT);
    let (transactions, events) = tokio::try_join!(
        state.store.recent::<Transaction>(page),
        state.store.recent::<Event>(page),
    )?;

    Ok(Json(ActivityResponse {
        transactions,
        events,
    }))
}

/// Dashboard routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard/stats", get(stats))
        .route("/api/dashboard/activity", get(activity))
}
