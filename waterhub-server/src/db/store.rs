//! Store facade over the PostgreSQL and in-memory backends
//!
//! Handlers hold a `Store` and never see which backend sits behind it.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::memory::MemoryStore;
use super::postgres::PgStore;
use crate::models::{
    Meter, MeterListing, OccupancyFilter, OccupancyListing, Pagination, Record, ValveStatus,
};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i32 },

    #[error("{field} does not reference an existing row")]
    MissingReference { field: &'static str },

    #[error("{resource} {id} is still referenced by other rows")]
    StillReferenced { resource: &'static str, id: i32 },

    #[error("row encoding error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl DbError {
    pub fn not_found<R: Record>(id: i32) -> Self {
        Self::NotFound {
            resource: R::RESOURCE,
            id,
        }
    }
}

/// Meter valve positions across the fleet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, FromRow)]
pub struct ValveCounts {
    #[sqlx(rename = "valves_open")]
    pub open: i64,
    #[sqlx(rename = "valves_closed")]
    pub closed: i64,
    #[sqlx(rename = "valves_offline")]
    pub offline: i64,
}

impl ValveCounts {
    pub fn tally(&mut self, status: ValveStatus) {
        match status {
            ValveStatus::Open => self.open += 1,
            ValveStatus::Closed => self.closed += 1,
            ValveStatus::Offline => self.offline += 1,
        }
    }
}

/// Body of `GET /api/dashboard/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub clients_count: i64,
    pub sites_count: i64,
    pub meters_count: i64,
    pub admins_count: i64,
    /// KES from successful transactions, all time
    pub total_revenue: f64,
    /// Litres sold since the start of the current UTC month
    pub monthly_consumption: f64,
    #[sqlx(flatten)]
    pub valves: ValveCounts,
}

/// Midnight UTC on the first day of `now`'s month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[derive(Debug, Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(PgStore::new(pool))
    }

    /// Empty in-memory store.
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::default())
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// All rows, id ascending.
    pub async fn list<R: Record>(&self) -> Result<Vec<R>, DbError> {
        match self {
            Self::Postgres(s) => s.list::<R>().await,
            Self::Memory(s) => s.list::<R>().await,
        }
    }

    pub async fn get<R: Record>(&self, id: i32) -> Result<R, DbError> {
        match self {
            Self::Postgres(s) => s.get::<R>(id).await,
            Self::Memory(s) => s.get::<R>(id).await,
        }
    }

    /// Insert a validated input and return the stored row.
    pub async fn insert<R: Record>(&self, new: &R::New) -> Result<R, DbError> {
        match self {
            Self::Postgres(s) => s.insert::<R>(new).await,
            Self::Memory(s) => s.insert::<R>(new).await,
        }
    }

    /// Write the supplied patch fields. An empty patch returns the row as is.
    pub async fn update<R: Record>(&self, id: i32, patch: &R::Patch) -> Result<R, DbError> {
        match self {
            Self::Postgres(s) => s.update::<R>(id, patch).await,
            Self::Memory(s) => s.update::<R>(id, patch).await,
        }
    }

    pub async fn delete<R: Record>(&self, id: i32) -> Result<(), DbError> {
        match self {
            Self::Postgres(s) => s.delete::<R>(id).await,
            Self::Memory(s) => s.delete::<R>(id).await,
        }
    }

    pub async fn count<R: Record>(&self) -> Result<i64, DbError> {
        match self {
            Self::Postgres(s) => s.count::<R>().await,
            Self::Memory(s) => s.count::<R>().await,
        }
    }

    /// Newest rows first.
    pub async fn recent<R: Record>(&self, page: Pagination) -> Result<Vec<R>, DbError> {
        match self {
            Self::Postgres(s) => s.recent::<R>(page).await,
            Self::Memory(s) => s.recent::<R>(page).await,
        }
    }

    /// Meters with the name of the tenant holding each one.
    pub async fn meter_listing(&self) -> Result<Vec<MeterListing>, DbError> {
        match self {
            Self::Postgres(s) => s.meter_listing().await,
            Self::Memory(s) => s.meter_listing().await,
        }
    }

    pub async fn occupancy_listing(
        &self,
        filter: &OccupancyFilter,
    ) -> Result<Vec<OccupancyListing>, DbError> {
        match self {
            Self::Postgres(s) => s.occupancy_listing(filter).await,
            Self::Memory(s) => s.occupancy_listing(filter).await,
        }
    }

    pub async fn dashboard_totals(&self) -> Result<DashboardTotals, DbError> {
        match self {
            Self::Postgres(s) => s.dashboard_totals().await,
            Self::Memory(s) => s.dashboard_totals().await,
        }
    }

    /// Move a meter's valve and record a `valve` event, atomically.
    pub async fn set_valve(&self, id: i32, status: ValveStatus) -> Result<Meter, DbError> {
        match self {
            Self::Postgres(s) => s.set_valve(id, status).await,
            Self::Memory(s) => s.set_valve(id, status).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_start_truncates() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 17, 45, 3).unwrap();
        assert_eq!(
            month_start(now),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn dashboard_totals_json_shape() {
        let mut valves = ValveCounts::default();
        valves.tally(ValveStatus::Open);
        valves.tally(ValveStatus::Offline);

        let totals = DashboardTotals {
            clients_count: 2,
            total_revenue: 150.5,
            valves,
            ..Default::default()
        };
        let json = serde_json::to_value(&totals).unwrap();
        assert_eq!(json["clientsCount"], 2);
        assert_eq!(json["totalRevenue"], 150.5);
        assert_eq!(json["monthlyConsumption"], 0.0);
        assert_eq!(
            json["valves"],
            serde_json::json!({ "open": 1, "closed": 0, "offline": 1 })
        );
    }

    #[test]
    fn not_found_message() {
        let err = DbError::not_found::<crate::models::Site>(7);
        assert_eq!(err.to_string(), "site 7 not found");
    }
}
