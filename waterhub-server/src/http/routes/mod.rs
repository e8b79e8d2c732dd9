//! Route handlers organized by resource

pub mod activity;
pub mod crud;
pub mod dashboard;
pub mod health;
pub mod meters;
pub mod occupancies;

use std::sync::Arc;

use axum::Router;

use super::server::AppState;
use crate::models::{
    Admin, BillingProfile, Client, Establishment, EstablishmentType, MpesaKey, OperationMode,
    Site,
};

/// Every API route
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(crud::router::<Admin>("/api/admins"))
        .merge(crud::router::<Client>("/api/clients"))
        .merge(crud::router::<Site>("/api/sites"))
        .merge(crud::router::<OperationMode>("/api/operation-modes"))
        .merge(crud::router::<EstablishmentType>("/api/establishment-types"))
        .merge(crud::router::<Establishment>("/api/establishments"))
        .merge(crud::router::<BillingProfile>("/api/billing-profiles"))
        .merge(crud::router::<MpesaKey>("/api/mpesa-keys"))
        .merge(meters::router())
        .merge(occupancies::router())
        .merge(activity::router())
        .merge(dashboard::router())
}
