//! In-memory backend
//!
//! Rows are kept as their JSON form, keyed by table name and id. Foreign
//! keys from [`super::schema`] are enforced the way PostgreSQL enforces
//! them, so handlers behave the same on either backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::schema::{self, OnDelete};
use super::store::{month_start, DashboardTotals, DbError, ValveCounts};
use crate::models::{
    Admin, Client, Event, Meter, MeterListing, MeterPatch, NewEvent, Occupancy, OccupancyFilter,
    OccupancyListing, Pagination, Record, Site, Transaction, TransactionStatus, ValveStatus,
};

#[derive(Debug, Default)]
struct Table {
    next_id: i32,
    rows: BTreeMap<i32, Value>,
}

#[derive(Debug, Default)]
struct Tables(HashMap<&'static str, Table>);

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub async fn list<R: Record>(&self) -> Result<Vec<R>, DbError> {
        self.tables.read().await.list::<R>()
    }

    pub async fn get<R: Record>(&self, id: i32) -> Result<R, DbError> {
        self.tables.read().await.get::<R>(id)
    }

    pub async fn insert<R: Record>(&self, new: &R::New) -> Result<R, DbError> {
        self.tables.write().await.insert::<R>(new)
    }

    pub async fn update<R: Record>(&self, id: i32, patch: &R::Patch) -> Result<R, DbError> {
        self.tables.write().await.update::<R>(id, patch)
    }

    pub async fn delete<R: Record>(&self, id: i32) -> Result<(), DbError> {
        self.tables.write().await.delete::<R>(id)
    }

    pub async fn count<R: Record>(&self) -> Result<i64, DbError> {
        let tables = self.tables.read().await;
        Ok(tables.rows(R::TABLE).count() as i64)
    }

    pub async fn recent<R: Record>(&self, page: Pagination) -> Result<Vec<R>, DbError> {
        let tables = self.tables.read().await;

        let mut rows: Vec<(DateTime<Utc>, i32, &Value)> = tables
            .0
            .get(R::TABLE)
            .map(|t| {
                t.rows
                    .iter()
                    .map(|(id, row)| (created_at(row), *id, row))
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));

        rows.into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|(_, _, row)| decode(row))
            .collect()
    }

    pub async fn meter_listing(&self) -> Result<Vec<MeterListing>, DbError> {
        let tables = self.tables.read().await;

        tables
            .list::<Meter>()?
            .into_iter()
            .map(|meter| {
                // Lowest-id occupancy holding the meter wins
                let customer_name = tables
                    .rows(Occupancy::TABLE)
                    .find(|o| refers(o, "meterId", meter.id))
                    .and_then(|o| o.get("customerName"))
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                Ok(MeterListing {
                    meter,
                    customer_name,
                })
            })
            .collect()
    }

    pub async fn occupancy_listing(
        &self,
        filter: &OccupancyFilter,
    ) -> Result<Vec<OccupancyListing>, DbError> {
        let tables = self.tables.read().await;

        let mut listings = Vec::new();
        for occupancy in tables.list::<Occupancy>()? {
            let meter = match occupancy.meter_id {
                Some(id) => tables.get::<Meter>(id).ok(),
                None => None,
            };
            let listing = OccupancyListing {
                meter_serial: meter.as_ref().map(|m| m.serial_no.clone()),
                meter_technology: meter.map(|m| m.technology),
                occupancy,
            };
            if filter.matches(&listing) {
                listings.push(listing);
            }
        }
        Ok(listings)
    }

    pub async fn dashboard_totals(&self) -> Result<DashboardTotals, DbError> {
        let tables = self.tables.read().await;
        let since = month_start(Utc::now());

        let mut totals = DashboardTotals {
            clients_count: tables.rows(Client::TABLE).count() as i64,
            sites_count: tables.rows(Site::TABLE).count() as i64,
            meters_count: tables.rows(Meter::TABLE).count() as i64,
            admins_count: tables.rows(Admin::TABLE).count() as i64,
            ..Default::default()
        };

        for tx in tables.list::<Transaction>()? {
            if tx.status == TransactionStatus::Success {
                totals.total_revenue += tx.amount;
            }
            if tx.created_at >= since {
                totals.monthly_consumption += tx.volume;
            }
        }

        let mut valves = ValveCounts::default();
        for meter in tables.list::<Meter>()? {
            valves.tally(meter.valve_status);
        }
        totals.valves = valves;

        Ok(totals)
    }

    pub async fn set_valve(&self, id: i32, status: ValveStatus) -> Result<Meter, DbError> {
        let mut tables = self.tables.write().await;

        let meter = tables.update::<Meter>(id, &MeterPatch::valve(status))?;
        tables.insert::<Event>(&NewEvent::valve(meter.id, &meter.serial_no, status))?;
        Ok(meter)
    }
}

impl Tables {
    fn rows(&self, table: &str) -> impl Iterator<Item = &Value> {
        self.0.get(table).into_iter().flat_map(|t| t.rows.values())
    }

    fn list<R: Record>(&self) -> Result<Vec<R>, DbError> {
        self.rows(R::TABLE).map(decode).collect()
    }

    fn get<R: Record>(&self, id: i32) -> Result<R, DbError> {
        let row = self
            .0
            .get(R::TABLE)
            .and_then(|t| t.rows.get(&id))
            .ok_or_else(|| DbError::not_found::<R>(id))?;
        decode(row)
    }

    fn exists(&self, table: &str, id: i64) -> bool {
        let Ok(id) = i32::try_from(id) else {
            return false;
        };
        self.0.get(table).is_some_and(|t| t.rows.contains_key(&id))
    }

    /// Every non-null reference in `row` must point at an existing parent.
    fn check_references(&self, table: &str, row: &Value) -> Result<(), DbError> {
        for fk in schema::outgoing(table) {
            let Some(value) = row.get(fk.field).filter(|v| !v.is_null()) else {
                continue;
            };
            let found = value.as_i64().is_some_and(|id| self.exists(fk.parent, id));
            if !found {
                return Err(DbError::MissingReference { field: fk.field });
            }
        }
        Ok(())
    }

    fn insert<R: Record>(&mut self, new: &R::New) -> Result<R, DbError> {
        let mut row = match serde_json::to_value(new)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        self.check_references(R::TABLE, &Value::Object(row.clone()))?;

        let table = self.0.entry(R::TABLE).or_default();
        let id = table.next_id + 1;
        row.insert("id".into(), id.into());
        row.insert("createdAt".into(), serde_json::to_value(Utc::now())?);

        // Round-trip through the row type so stored JSON matches its shape
        let record: R = serde_json::from_value(Value::Object(row))?;
        table.rows.insert(id, serde_json::to_value(&record)?);
        table.next_id = id;

        Ok(record)
    }

    fn update<R: Record>(&mut self, id: i32, patch: &R::Patch) -> Result<R, DbError> {
        let mut row = self
            .0
            .get(R::TABLE)
            .and_then(|t| t.rows.get(&id))
            .cloned()
            .ok_or_else(|| DbError::not_found::<R>(id))?;

        if let (Value::Object(current), Value::Object(changes)) =
            (&mut row, serde_json::to_value(patch)?)
        {
            current.extend(changes);
        }

        self.check_references(R::TABLE, &row)?;

        let record: R = serde_json::from_value(row)?;
        let stored = serde_json::to_value(&record)?;
        self.0.entry(R::TABLE).or_default().rows.insert(id, stored);

        Ok(record)
    }

    fn delete<R: Record>(&mut self, id: i32) -> Result<(), DbError> {
        if !self.exists(R::TABLE, i64::from(id)) {
            return Err(DbError::not_found::<R>(id));
        }

        let blocked = schema::incoming(R::TABLE)
            .filter(|fk| fk.on_delete == OnDelete::Restrict)
            .any(|fk| self.rows(fk.table).any(|row| refers(row, fk.field, id)));
        if blocked {
            return Err(DbError::StillReferenced {
                resource: R::RESOURCE,
                id,
            });
        }

        for fk in schema::incoming(R::TABLE).filter(|fk| fk.on_delete == OnDelete::SetNull) {
            if let Some(child) = self.0.get_mut(fk.table) {
                for row in child.rows.values_mut() {
                    if refers(row, fk.field, id) {
                        row[fk.field] = Value::Null;
                    }
                }
            }
        }

        if let Some(table) = self.0.get_mut(R::TABLE) {
            table.rows.remove(&id);
        }
        Ok(())
    }
}

fn decode<R: Record>(row: &Value) -> Result<R, DbError> {
    Ok(serde_json::from_value(row.clone())?)
}

fn refers(row: &Value, field: &str, id: i32) -> bool {
    row.get(field).and_then(Value::as_i64) == Some(i64::from(id))
}

fn created_at(row: &Value) -> DateTime<Utc> {
    row.get("createdAt")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Establishment, EstablishmentType, NewContact, NewEstablishment, NewEstablishmentType,
        NewMeter, NewOccupancy, NewOperationMode, NewSite, NewTransaction, OccupancyPatch,
        OccupancyStatus, OperationMode, SitePatch,
    };

    fn contact(name: &str) -> NewContact {
        NewContact {
            name: name.into(),
            email: "owner@example.com".into(),
            address: "Ngong Road".into(),
            phone: "0711000000".into(),
        }
    }

    struct Fixture {
        store: MemoryStore,
        client: Client,
        site: Site,
        establishment: Establishment,
        meter: Meter,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::default();
        let client = store.insert::<Client>(&contact("Acme Estates")).await.unwrap();
        let site = store
            .insert::<Site>(&NewSite {
                site_name: "Kilimani".into(),
                client_id: client.id,
            })
            .await
            .unwrap();
        let kind = store
            .insert::<EstablishmentType>(&NewEstablishmentType {
                type_name: "Residential".into(),
            })
            .await
            .unwrap();
        let establishment = store
            .insert::<Establishment>(&NewEstablishment {
                establishment_name: "Block A".into(),
                establishment_type_id: kind.id,
                site_id: site.id,
            })
            .await
            .unwrap();
        let mode = store
            .insert::<OperationMode>(&NewOperationMode {
                mode_name: "Active".into(),
                mode_description: "Meter is fully operational".into(),
            })
            .await
            .unwrap();
        let new_meter: NewMeter = serde_json::from_value(serde_json::json!({
            "serialNo": "SN-001",
            "imeiNo": "356938035643809",
            "clientId": client.id,
            "establishmentId": establishment.id,
            "operationModeId": mode.id,
            "simcard": "0722000000",
            "type": "prepaid",
            "meterSize": "15mm",
            "technology": "LoRaWAN"
        }))
        .unwrap();
        let meter = store.insert::<Meter>(&new_meter).await.unwrap();

        Fixture {
            store,
            client,
            site,
            establishment,
            meter,
        }
    }

    fn occupancy(establishment_id: i32, unit: &str, meter_id: Option<i32>) -> NewOccupancy {
        NewOccupancy {
            establishment_id,
            unit_number: unit.into(),
            customer_name: Some(format!("Tenant {}", unit)),
            customer_phone: Some("0733000000".into()),
            customer_email: None,
            meter_id,
            status: OccupancyStatus::Occupied,
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_and_rows_round_trip() {
        let store = MemoryStore::default();
        let a = store.insert::<Admin>(&contact("One")).await.unwrap();
        let b = store.insert::<Admin>(&contact("Two")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let fetched = store.get::<Admin>(2).await.unwrap();
        assert_eq!(fetched, b);
        assert_eq!(store.list::<Admin>().await.unwrap(), vec![a, b]);
        assert_eq!(store.count::<Admin>().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = MemoryStore::default();
        let a = store.insert::<Admin>(&contact("One")).await.unwrap();
        store.delete::<Admin>(a.id).await.unwrap();
        let b = store.insert::<Admin>(&contact("Two")).await.unwrap();
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn unknown_parent_rejected_on_insert_and_update() {
        let store = MemoryStore::default();
        let err = store
            .insert::<Site>(&NewSite {
                site_name: "Orphan".into(),
                client_id: 42,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::MissingReference { field: "clientId" }));

        let f = fixture().await;
        let err = f
            .store
            .update::<Site>(
                f.site.id,
                &SitePatch {
                    client_id: Some(99),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::MissingReference { field: "clientId" }));
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let f = fixture().await;
        let updated = f
            .store
            .update::<Site>(
                f.site.id,
                &SitePatch {
                    site_name: Some("Lavington".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.site_name, "Lavington");
        assert_eq!(updated.client_id, f.site.client_id);
        assert_eq!(updated.created_at, f.site.created_at);

        let unchanged = f
            .store
            .update::<Site>(f.site.id, &SitePatch::default())
            .await
            .unwrap();
        assert_eq!(unchanged, updated);
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let store = MemoryStore::default();
        assert!(matches!(
            store.get::<Client>(1).await.unwrap_err(),
            DbError::NotFound { resource: "client", id: 1 }
        ));
        assert!(matches!(
            store.delete::<Client>(1).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert!(matches!(
            store.update::<Site>(3, &SitePatch::default()).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn restrict_blocks_parent_delete() {
        let f = fixture().await;
        let err = f.store.delete::<Client>(f.client.id).await.unwrap_err();
        assert!(matches!(err, DbError::StillReferenced { resource: "client", .. }));
        assert!(f.store.get::<Client>(f.client.id).await.is_ok());
    }

    #[tokio::test]
    async fn set_null_clears_children() {
        let f = fixture().await;
        let occ = f
            .store
            .insert::<Occupancy>(&occupancy(f.establishment.id, "A1", Some(f.meter.id)))
            .await
            .unwrap();

        f.store.delete::<Meter>(f.meter.id).await.unwrap();

        let occ = f.store.get::<Occupancy>(occ.id).await.unwrap();
        assert_eq!(occ.meter_id, None);
    }

    #[tokio::test]
    async fn meter_listing_carries_customer_name() {
        let f = fixture().await;
        let listing = f.store.meter_listing().await.unwrap();
        assert_eq!(listing[0].customer_name, None);

        f.store
            .insert::<Occupancy>(&occupancy(f.establishment.id, "B2", Some(f.meter.id)))
            .await
            .unwrap();
        f.store
            .insert::<Occupancy>(&occupancy(f.establishment.id, "B3", Some(f.meter.id)))
            .await
            .unwrap();

        let listing = f.store.meter_listing().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].customer_name.as_deref(), Some("Tenant B2"));
        assert_eq!(listing[0].meter, f.meter);
    }

    #[tokio::test]
    async fn occupancy_listing_filters_and_joins() {
        let f = fixture().await;
        f.store
            .insert::<Occupancy>(&occupancy(f.establishment.id, "C1", Some(f.meter.id)))
            .await
            .unwrap();
        let vacant = f
            .store
            .insert::<Occupancy>(&occupancy(f.establishment.id, "C2", None))
            .await
            .unwrap();
        f.store
            .update::<Occupancy>(
                vacant.id,
                &OccupancyPatch {
                    status: Some(OccupancyStatus::Vacant),
                    customer_name: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let all = f
            .store
            .occupancy_listing(&OccupancyFilter {
                establishment_id: Some(f.establishment.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].meter_serial.as_deref(), Some("SN-001"));
        assert_eq!(all[0].meter_technology.as_deref(), Some("LoRaWAN"));
        assert_eq!(all[1].meter_serial, None);
        assert_eq!(all[1].occupancy.customer_name, None);

        let vacant_only = f
            .store
            .occupancy_listing(&OccupancyFilter {
                status: Some(OccupancyStatus::Vacant),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(vacant_only.len(), 1);
        assert_eq!(vacant_only[0].occupancy.unit_number, "C2");

        let searched = f
            .store
            .occupancy_listing(&OccupancyFilter {
                search: Some("tenant c1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
    }

    #[tokio::test]
    async fn set_valve_persists_and_logs_event() {
        let f = fixture().await;
        let meter = f.store.set_valve(f.meter.id, ValveStatus::Closed).await.unwrap();
        assert_eq!(meter.valve_status, ValveStatus::Closed);
        assert_eq!(meter.serial_no, f.meter.serial_no);

        let stored = f.store.get::<Meter>(f.meter.id).await.unwrap();
        assert_eq!(stored.valve_status, ValveStatus::Closed);

        let events = f.store.recent::<Event>(Pagination::default()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].meter_id, Some(f.meter.id));

        assert!(matches!(
            f.store.set_valve(999, ValveStatus::Open).await.unwrap_err(),
            DbError::NotFound { resource: "meter", id: 999 }
        ));
        assert_eq!(f.store.count::<Event>().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_paged() {
        let store = MemoryStore::default();
        for i in 0..5 {
            store
                .insert::<Transaction>(&NewTransaction {
                    meter_id: None,
                    amount: f64::from(i),
                    volume: 10.0,
                    status: TransactionStatus::Success,
                    reference: None,
                    phone: None,
                })
                .await
                .unwrap();
        }

        let page = store.recent::<Transaction>(Pagination::new(1, 2)).await.unwrap();
        let ids: Vec<_> = page.iter().map(|t| t.id).collect();
        assert_eq!(ids, [5, 4]);

        let page = store.recent::<Transaction>(Pagination::new(3, 2)).await.unwrap();
        let ids: Vec<_> = page.iter().map(|t| t.id).collect();
        assert_eq!(ids, [1]);
    }

    #[tokio::test]
    async fn dashboard_sums_successful_revenue() {
        let f = fixture().await;
        for (amount, status) in [
            (100.0, TransactionStatus::Success),
            (40.0, TransactionStatus::Failed),
            (60.5, TransactionStatus::Success),
        ] {
            f.store
                .insert::<Transaction>(&NewTransaction {
                    meter_id: Some(f.meter.id),
                    amount,
                    volume: 250.0,
                    status,
                    reference: None,
                    phone: None,
                })
                .await
                .unwrap();
        }
        f.store.set_valve(f.meter.id, ValveStatus::Offline).await.unwrap();

        let totals = f.store.dashboard_totals().await.unwrap();
        assert_eq!(totals.clients_count, 1);
        assert_eq!(totals.sites_count, 1);
        assert_eq!(totals.meters_count, 1);
        assert_eq!(totals.admins_count, 0);
        assert_eq!(totals.total_revenue, 160.5);
        assert_eq!(totals.monthly_consumption, 750.0);
        assert_eq!(
            totals.valves,
            ValveCounts {
                open: 0,
                closed: 0,
                offline: 1
            }
        );
    }
}
