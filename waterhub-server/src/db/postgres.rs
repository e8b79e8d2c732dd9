//! PostgreSQL backend
//!
//! Generic statements are assembled with `QueryBuilder`; table and column
//! names come from `Record`/`Columns` impls, never from requests, and
//! every value is bound.

use sqlx::{PgPool, Postgres, QueryBuilder};

use super::schema;
use super::store::{month_start, DashboardTotals, DbError};
use crate::models::{
    Column, Columns, Event, Meter, MeterListing, NewEvent, OccupancyFilter, OccupancyListing,
    Pagination, Record, ValveStatus,
};

const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list<R: Record>(&self) -> Result<Vec<R>, DbError> {
        let rows = sqlx::query_as::<_, R>(&format!("SELECT * FROM {} ORDER BY id", R::TABLE))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get<R: Record>(&self, id: i32) -> Result<R, DbError> {
        sqlx::query_as::<_, R>(&format!("SELECT * FROM {} WHERE id = $1", R::TABLE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found::<R>(id))
    }

    pub async fn insert<R: Record>(&self, new: &R::New) -> Result<R, DbError> {
        let mut query = insert_query(R::TABLE, new);
        let row = query
            .build_query_as::<R>()
            .fetch_one(&self.pool)
            .await
            .map_err(write_error)?;

        tracing::debug!(resource = R::RESOURCE, id = row.id(), "inserted");
        Ok(row)
    }

    pub async fn update<R: Record>(&self, id: i32, patch: &R::Patch) -> Result<R, DbError> {
        let columns = patch.columns();
        if columns.is_empty() {
            return self.get::<R>(id).await;
        }

        let mut query = update_query(R::TABLE, id, columns);
        query
            .build_query_as::<R>()
            .fetch_optional(&self.pool)
            .await
            .map_err(write_error)?
            .ok_or_else(|| DbError::not_found::<R>(id))
    }

    pub async fn delete<R: Record>(&self, id: i32) -> Result<(), DbError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", R::TABLE))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    DbError::StillReferenced {
                        resource: R::RESOURCE,
                        id,
                    }
                } else {
                    DbError::Sqlx(err)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found::<R>(id));
        }
        Ok(())
    }

    pub async fn count<R: Record>(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", R::TABLE))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn recent<R: Record>(&self, page: Pagination) -> Result<Vec<R>, DbError> {
        let rows = sqlx::query_as::<_, R>(&format!(
            "SELECT * FROM {} ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            R::TABLE
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// One row per meter; a meter held by several units reports the
    /// lowest-id occupancy.
    pub async fn meter_listing(&self) -> Result<Vec<MeterListing>, DbError> {
        let rows = sqlx::query_as::<_, MeterListing>(
            r#"
            SELECT m.*, o.customer_name
            FROM meters m
            LEFT JOIN LATERAL (
                SELECT customer_name
                FROM occupancies
                WHERE meter_id = m.id
                ORDER BY id
                LIMIT 1
            ) o ON TRUE
            ORDER BY m.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn occupancy_listing(
        &self,
        filter: &OccupancyFilter,
    ) -> Result<Vec<OccupancyListing>, DbError> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT o.*, m.serial_no AS meter_serial, m.technology AS meter_technology
            FROM occupancies o
            LEFT JOIN meters m ON m.id = o.meter_id
            WHERE TRUE
            "#,
        );

        if let Some(id) = filter.establishment_id {
            query.push(" AND o.establishment_id = ").push_bind(id);
        }
        if let Some(status) = filter.status {
            query.push(" AND o.status = ").push_bind(status.as_str());
        }
        if let Some(term) = filter.search_term() {
            let pattern = format!("%{}%", escape_like(&term));
            query
                .push(" AND (o.unit_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR o.customer_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR o.customer_phone ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY o.id");

        let rows = query
            .build_query_as::<OccupancyListing>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn dashboard_totals(&self) -> Result<DashboardTotals, DbError> {
        let totals = sqlx::query_as::<_, DashboardTotals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM clients) AS clients_count,
                (SELECT COUNT(*) FROM sites) AS sites_count,
                (SELECT COUNT(*) FROM meters) AS meters_count,
                (SELECT COUNT(*) FROM admins) AS admins_count,
                (SELECT COALESCE(SUM(amount), 0) FROM transactions
                    WHERE status = 'success') AS total_revenue,
                (SELECT COALESCE(SUM(volume), 0) FROM transactions
                    WHERE created_at >= $1) AS monthly_consumption,
                (SELECT COUNT(*) FROM meters WHERE valve_status = 'open') AS valves_open,
                (SELECT COUNT(*) FROM meters WHERE valve_status = 'closed') AS valves_closed,
                (SELECT COUNT(*) FROM meters WHERE valve_status = 'offline') AS valves_offline
            "#,
        )
        .bind(month_start(chrono::Utc::now()))
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    pub async fn set_valve(&self, id: i32, status: ValveStatus) -> Result<Meter, DbError> {
        let mut tx = self.pool.begin().await?;

        let meter = sqlx::query_as::<_, Meter>(
            "UPDATE meters SET valve_status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found::<Meter>(id))?;

        let event = NewEvent::valve(meter.id, &meter.serial_no, status);
        insert_query(Event::TABLE, &event)
            .build()
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(meter)
    }
}

fn insert_query(table: &str, new: &impl Columns) -> QueryBuilder<'static, Postgres> {
    let columns = new.columns();
    let names: Vec<_> = columns.iter().map(|(name, _)| *name).collect();

    let mut query = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        table,
        names.join(", ")
    ));
    for (i, (_, value)) in columns.into_iter().enumerate() {
        if i > 0 {
            query.push(", ");
        }
        push_value(&mut query, value);
    }
    query.push(") RETURNING *");
    query
}

fn update_query(
    table: &str,
    id: i32,
    columns: Vec<(&'static str, Column)>,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("UPDATE {} SET ", table));
    for (i, (name, value)) in columns.into_iter().enumerate() {
        if i > 0 {
            query.push(", ");
        }
        query.push(name).push(" = ");
        push_value(&mut query, value);
    }
    query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
    query
}

fn push_value(query: &mut QueryBuilder<'static, Postgres>, value: Column) {
    match value {
        Column::Text(v) => query.push_bind(v),
        Column::Int(v) => query.push_bind(v),
        Column::Float(v) => query.push_bind(v),
        Column::Bool(v) => query.push_bind(v),
        Column::Timestamp(v) => query.push_bind(v),
    };
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
    )
}

/// Map a failed INSERT/UPDATE: a dangling reference names its field.
fn write_error(err: sqlx::Error) -> DbError {
    if !is_foreign_key_violation(&err) {
        return DbError::Sqlx(err);
    }

    let field = match &err {
        sqlx::Error::Database(db) => db
            .constraint()
            .and_then(schema::by_constraint)
            .map(|fk| fk.field),
        _ => None,
    };
    DbError::MissingReference {
        field: field.unwrap_or("id"),
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, migrations, ValveCounts};
    use crate::models::{
        Client, Establishment, EstablishmentType, MeterPatch, NewContact, NewEstablishment,
        NewEstablishmentType, NewMeter, NewOccupancy, NewOperationMode, NewSite, NewTransaction,
        Occupancy, OccupancyStatus, OperationMode, Site, Transaction, TransactionStatus,
    };

    #[test]
    fn insert_sql_binds_every_column() {
        let site = NewSite {
            site_name: "Kilimani".into(),
            client_id: 3,
        };
        let query = insert_query("sites", &site);
        assert_eq!(
            query.sql(),
            "INSERT INTO sites (site_name, client_id) VALUES ($1, $2) RETURNING *"
        );
    }

    #[test]
    fn update_sql_puts_id_last() {
        let query = update_query(
            "meters",
            9,
            vec![
                ("valve_status", Column::text("closed")),
                ("establishment_id", Column::Int(None)),
            ],
        );
        assert_eq!(
            query.sql(),
            "UPDATE meters SET valve_status = $1, establishment_id = $2 WHERE id = $3 RETURNING *"
        );
    }

    #[test]
    fn like_wildcards_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("grace"), "grace");
    }

    async fn store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        migrations::run(&pool).await.expect("migrations failed");
        PgStore::new(pool)
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn site_with_unknown_client_is_rejected() {
        let store = store().await;
        let err = store
            .insert::<Site>(&NewSite {
                site_name: "Nowhere".into(),
                client_id: i32::MAX,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::MissingReference { field: "clientId" }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn referenced_client_cannot_be_deleted() {
        let store = store().await;
        let client = store
            .insert::<Client>(&NewContact {
                name: "Delete Guard".into(),
                email: "guard@example.com".into(),
                address: "Westlands".into(),
                phone: "0700111222".into(),
            })
            .await
            .expect("insert client");
        let site = store
            .insert::<Site>(&NewSite {
                site_name: "Guarded".into(),
                client_id: client.id,
            })
            .await
            .expect("insert site");

        let err = store.delete::<Client>(client.id).await.unwrap_err();
        assert!(matches!(err, DbError::StillReferenced { .. }));

        store.delete::<Site>(site.id).await.expect("delete site");
        store.delete::<Client>(client.id).await.expect("delete client");
        assert!(matches!(
            store.get::<Client>(client.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    /// Rows owned by one test, tagged so parallel tests never collide.
    struct Fixture {
        store: PgStore,
        tag: String,
        establishment: Establishment,
        meter: Meter,
    }

    async fn fixture() -> Fixture {
        let store = store().await;
        let tag = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_string();

        let client = store
            .insert::<Client>(&NewContact {
                name: format!("Fixture {}", tag),
                email: "fixture@example.com".into(),
                address: "Upper Hill".into(),
                phone: "0700333444".into(),
            })
            .await
            .expect("insert client");
        let site = store
            .insert::<Site>(&NewSite {
                site_name: format!("Site {}", tag),
                client_id: client.id,
            })
            .await
            .expect("insert site");
        let kind = store
            .insert::<EstablishmentType>(&NewEstablishmentType {
                type_name: format!("Type {}", tag),
            })
            .await
            .expect("insert type");
        let establishment = store
            .insert::<Establishment>(&NewEstablishment {
                establishment_name: format!("Block {}", tag),
                establishment_type_id: kind.id,
                site_id: site.id,
            })
            .await
            .expect("insert establishment");
        let mode = store
            .insert::<OperationMode>(&NewOperationMode {
                mode_name: format!("Mode {}", tag),
                mode_description: "fixture".into(),
            })
            .await
            .expect("insert mode");
        let meter = store
            .insert::<Meter>(&new_meter(&tag, client.id, Some(establishment.id), mode.id))
            .await
            .expect("insert meter");

        Fixture {
            store,
            tag,
            establishment,
            meter,
        }
    }

    fn new_meter(tag: &str, client_id: i32, establishment_id: Option<i32>, mode_id: i32) -> NewMeter {
        NewMeter {
            serial_no: format!("SN-{}", tag),
            imei_no: "356938035643809".into(),
            client_id,
            establishment_id,
            operation_mode_id: mode_id,
            simcard: "0722000000".into(),
            meter_type: "prepaid".into(),
            meter_size: "15mm".into(),
            technology: "LoRaWAN".into(),
            valve_status: ValveStatus::Open,
            latest_reading: 0.0,
            last_reading_time: None,
        }
    }

    fn unit(f: &Fixture, number: &str, name: Option<&str>, meter_id: Option<i32>) -> NewOccupancy {
        NewOccupancy {
            establishment_id: f.establishment.id,
            unit_number: number.into(),
            customer_name: name.map(Into::into),
            customer_phone: Some("0733000000".into()),
            customer_email: None,
            meter_id,
            status: if name.is_some() {
                OccupancyStatus::Occupied
            } else {
                OccupancyStatus::Vacant
            },
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn meter_listing_carries_customer_name() {
        let f = fixture().await;
        f.store
            .insert::<Occupancy>(&unit(&f, "A1", Some("Grace Malalo"), Some(f.meter.id)))
            .await
            .expect("insert occupancy");
        f.store
            .insert::<Occupancy>(&unit(&f, "A2", Some("Second Holder"), Some(f.meter.id)))
            .await
            .expect("insert occupancy");

        let listing = f.store.meter_listing().await.expect("meter listing");
        let ours: Vec<_> = listing.iter().filter(|m| m.meter.id == f.meter.id).collect();
        assert_eq!(ours.len(), 1);
        assert_eq!(ours[0].customer_name.as_deref(), Some("Grace Malalo"));
        assert_eq!(ours[0].meter.serial_no, format!("SN-{}", f.tag));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn occupancy_listing_filters_and_joins() {
        let f = fixture().await;
        for occupancy in [
            unit(&f, "A1", Some("Grace Malalo"), Some(f.meter.id)),
            unit(&f, "A2", None, None),
            unit(&f, "B_1", Some("Peter Otieno"), None),
            unit(&f, "BX1", Some("Mary Wambui"), None),
        ] {
            f.store
                .insert::<Occupancy>(&occupancy)
                .await
                .expect("insert occupancy");
        }

        let scoped = |status: Option<OccupancyStatus>, search: Option<&str>| OccupancyFilter {
            establishment_id: Some(f.establishment.id),
            status,
            search: search.map(Into::into),
        };

        let all = f.store.occupancy_listing(&scoped(None, None)).await.expect("listing");
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].occupancy.unit_number, "A1");
        assert_eq!(all[0].meter_serial, Some(f.meter.serial_no.clone()));
        assert_eq!(all[0].meter_technology.as_deref(), Some("LoRaWAN"));
        assert_eq!(all[1].meter_serial, None);

        let vacant = f
            .store
            .occupancy_listing(&scoped(Some(OccupancyStatus::Vacant), None))
            .await
            .expect("listing");
        assert_eq!(vacant.len(), 1);
        assert_eq!(vacant[0].occupancy.unit_number, "A2");

        let by_name = f
            .store
            .occupancy_listing(&scoped(None, Some("GRACE")))
            .await
            .expect("listing");
        assert_eq!(by_name.len(), 1);

        // `_` is literal, so BX1 must not match
        let literal = f
            .store
            .occupancy_listing(&scoped(None, Some("b_")))
            .await
            .expect("listing");
        assert_eq!(literal.len(), 1);
        assert_eq!(literal[0].occupancy.unit_number, "B_1");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn set_valve_persists_and_logs_event() {
        let f = fixture().await;
        let meter = f
            .store
            .set_valve(f.meter.id, ValveStatus::Closed)
            .await
            .expect("set valve");
        assert_eq!(meter.valve_status, ValveStatus::Closed);

        let stored = f.store.get::<Meter>(f.meter.id).await.expect("get meter");
        assert_eq!(stored.valve_status, ValveStatus::Closed);

        let events = f
            .store
            .recent::<Event>(Pagination::new(1, 200))
            .await
            .expect("recent events");
        assert!(events
            .iter()
            .any(|e| e.meter_id == Some(f.meter.id) && e.description.contains(&f.meter.serial_no)));

        assert!(matches!(
            f.store.set_valve(i32::MAX, ValveStatus::Open).await.unwrap_err(),
            DbError::NotFound { resource: "meter", .. }
        ));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_binds_null_and_delete_sets_null() {
        let f = fixture().await;

        let patch = MeterPatch {
            establishment_id: Some(None),
            ..Default::default()
        };
        let detached = f.store.update::<Meter>(f.meter.id, &patch).await.expect("update");
        assert_eq!(detached.establishment_id, None);
        assert_eq!(detached.serial_no, f.meter.serial_no);

        let occupancy = f
            .store
            .insert::<Occupancy>(&unit(&f, "C1", Some("Holder"), Some(f.meter.id)))
            .await
            .expect("insert occupancy");
        let tx = f
            .store
            .insert::<Transaction>(&NewTransaction {
                meter_id: Some(f.meter.id),
                amount: 10.0,
                volume: 0.0,
                status: TransactionStatus::Pending,
                reference: None,
                phone: None,
            })
            .await
            .expect("insert transaction");

        f.store.delete::<Meter>(f.meter.id).await.expect("delete meter");

        let occupancy = f.store.get::<Occupancy>(occupancy.id).await.expect("get occupancy");
        assert_eq!(occupancy.meter_id, None);
        let tx = f.store.get::<Transaction>(tx.id).await.expect("get transaction");
        assert_eq!(tx.meter_id, None);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn dashboard_sums_successful_revenue() {
        let f = fixture().await;
        let before = f.store.dashboard_totals().await.expect("totals");

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
                .expect("insert transaction");
        }
        f.store
            .set_valve(f.meter.id, ValveStatus::Offline)
            .await
            .expect("set valve");

        let after = f.store.dashboard_totals().await.expect("totals");
        assert!((after.total_revenue - before.total_revenue - 160.5).abs() < 1e-6);
        assert!((after.monthly_consumption - before.monthly_consumption - 750.0).abs() < 1e-6);
        assert!(after.clients_count >= 1);
        assert!(after.meters_count >= 1);
        assert!(after.valves.offline >= 1);
        let ValveCounts { open, closed, offline } = after.valves;
        assert_eq!(open + closed + offline, after.meters_count);
    }
}
