//! Database layer - connection pool, schema and the two store backends
//!
//! # Design Principles
//!
//! - Connection pool (max 5 connections by default) - no Arc<Mutex<Connection>>
//! - Listings use JOINs - no N+1 queries
//! - Rely on DB constraints, map their violations - no check-then-insert
//! - Transactions for multi-step operations (valve toggle + event)

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod schema;
pub mod seed;
pub mod store;

pub use memory::MemoryStore;
pub use pool::{create_pool, create_pool_with_options};
pub use postgres::PgStore;
pub use sqlx::PgPool;
pub use store::{DashboardTotals, DbError, Store, ValveCounts};
