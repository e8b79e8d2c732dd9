//! Transaction and event feeds, newest first

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use super::crud;
use crate::http::error::ApiError;
use crate::http::extractors::ValidQuery;
use crate::http::server::AppState;
use crate::models::{Event, PaginationParams, Record, Transaction};

async fn recent<R: Record>(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<PaginationParams>,
) -> Result<Json<Vec<R>>, ApiError> {
    let rows = state.store.recent::<R>(params.into()).await?;
    Ok(Json(rows))
}

/// Activity routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/transactions",
            get(recent::<Transaction>).post(crud::create::<Transaction>),
        )
        .route(
            "/api/events",
            get(recent::<Event>).post(crud::create::<Event>),
        )
}
