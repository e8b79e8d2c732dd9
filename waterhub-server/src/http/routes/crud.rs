//! Generic create/read/update/delete endpoints
//!
//! `router::<R>("/api/sites")` mounts:
//!
//! - `GET    /api/sites`       list, id ascending
//! - `POST   /api/sites`       create (201)
//! - `GET    /api/sites/{id}`  fetch
//! - `PUT    /api/sites/{id}`  partial update
//! - `DELETE /api/sites/{id}`  delete (204)
//!
//! Resources with a custom listing mount [`item_router`] and their own
//! collection route instead.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::http::error::ApiError;
use crate::http::extractors::{ValidId, ValidJson};
use crate::http::server::AppState;
use crate::models::Record;

/// GET /api/{resource}
pub async fn list<R: Record>(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<R>>, ApiError> {
    let rows = state.store.list::<R>().await?;
    Ok(Json(rows))
}

/// GET /api/{resource}/{id}
pub async fn fetch<R: Record>(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<R>, ApiError> {
    let row = state.store.get::<R>(id).await?;
    Ok(Json(row))
}

/// POST /api/{resource}
pub async fn create<R: Record>(
    State(state): State<Arc<AppState>>,
    ValidJson(new): ValidJson<R::New>,
) -> Result<(StatusCode, Json<R>), ApiError> {
    let row = state.store.insert::<R>(&new).await?;
    tracing::info!(resource = R::RESOURCE, id = row.id(), "created");
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/{resource}/{id}
pub async fn update<R: Record>(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    ValidJson(patch): ValidJson<R::Patch>,
) -> Result<Json<R>, ApiError> {
    let row = state.store.update::<R>(id, &patch).await?;
    tracing::info!(resource = R::RESOURCE, id, "updated");
    Ok(Json(row))
}

/// DELETE /api/{resource}/{id}
pub async fn remove<R: Record>(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<StatusCode, ApiError> {
    state.store.delete::<R>(id).await?;
    tracing::info!(resource = R::RESOURCE, id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Full resource routes
pub fn router<R: Record>(path: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(path, get(list::<R>).post(create::<R>))
        .merge(item_router::<R>(path))
}

/// `/{id}` routes only
pub fn item_router<R: Record>(path: &str) -> Router<Arc<AppState>> {
    Router::new().route(
        &format!("{}/{{id}}", path),
        get(fetch::<R>).put(update::<R>).delete(remove::<R>),
    )
}
