//! waterhub-server: REST back-office for a water utility
//!
//! Clients, sites, establishments, occupancy units, meters, billing
//! profiles and M-PESA credentials behind uniform CRUD endpoints, plus a
//! dashboard over transactions, events and valve state.

pub mod db;
pub mod http;
pub mod models;

pub use db::{DbError, Store};
pub use http::{run_server, ServerConfig, ServerError};
