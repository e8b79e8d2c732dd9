//! Occupancy endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use super::crud;
use crate::http::error::ApiError;
use crate::http::extractors::{ValidId, ValidQuery};
use crate::http::server::AppState;
use crate::models::{Establishment, Occupancy, OccupancyFilter, OccupancyListing};

/// GET /api/occupancies?status=&search=
async fn list_occupancies(
    State(state): State<Arc<AppState>>,
    ValidQuery(filter): ValidQuery<OccupancyFilter>,
) -> Result<Json<Vec<OccupancyListing>>, ApiError> {
    let rows = state.store.occupancy_listing(&filter).await?;
    Ok(Json(rows))
}

/// GET /api/establishments/{id}/occupancies
async fn establishment_occupancies(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    ValidQuery(filter): ValidQuery<OccupancyFilter>,
) -> Result<Json<Vec<OccupancyListing>>, ApiError> {
    // 404 for an unknown establishment rather than an empty list
    state.store.get::<Establishment>(id).await?;

    let filter = OccupancyFilter {
        establishment_id: Some(id),
        ..filter
    };
    let rows = state.store.occupancy_listing(&filter).await?;
    Ok(Json(rows))
}

/// Occupancy routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/occupancies",
            get(list_occupancies).post(crud::create::<Occupancy>),
        )
        .route(
            "/api/establishments/{id}/occupancies",
            get(establishment_occupancies),
        )
        .merge(crud::item_router::<Occupancy>("/api/occupancies"))
}
