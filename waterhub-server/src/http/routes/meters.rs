//! Meter endpoints
//!
//! The collection listing joins the holding tenant's name; item routes
//! are the generic ones. The valve has its own endpoint so that every
//! toggle lands in the activity feed.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};

use super::crud;
use crate::http::error::ApiError;
use crate::http::extractors::{ValidId, ValidJson};
use crate::http::server::AppState;
use crate::models::{Meter, MeterListing, ValveRequest};

/// GET /api/meters
async fn list_meters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MeterListing>>, ApiError> {
    let meters = state.store.meter_listing().await?;
    Ok(Json(meters))
}

/// PATCH /api/meters/{id}/valve
async fn set_valve(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    ValidJson(req): ValidJson<ValveRequest>,
) -> Result<Json<Meter>, ApiError> {
    let meter = state.store.set_valve(id, req.status).await?;
    tracing::info!(meter_id = id, status = %req.status, "valve set");
    Ok(Json(meter))
}

/// Meter routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/meters", get(list_meters).post(crud::create::<Meter>))
        .route("/api/meters/{id}/valve", patch(set_valve))
        .merge(crud::item_router::<Meter>("/api/meters"))
}
