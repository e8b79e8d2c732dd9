//! Schema migrations
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so this runs on each
//! startup. Tables are created parents first.

use sqlx::PgPool;

use super::schema::FOREIGN_KEYS;
use super::DbError;

pub(crate) const TABLES: &[(&str, &str)] = &[
    (
        "admins",
        r#"
        CREATE TABLE IF NOT EXISTS admins (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            address TEXT NOT NULL,
            phone TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "clients",
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            address TEXT NOT NULL,
            phone TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "sites",
        r#"
        CREATE TABLE IF NOT EXISTS sites (
            id SERIAL PRIMARY KEY,
            site_name TEXT NOT NULL,
            client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE RESTRICT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "operation_modes",
        r#"
        CREATE TABLE IF NOT EXISTS operation_modes (
            id SERIAL PRIMARY KEY,
            mode_name TEXT NOT NULL,
            mode_description TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "establishment_types",
        r#"
        CREATE TABLE IF NOT EXISTS establishment_types (
            id SERIAL PRIMARY KEY,
            type_name TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "establishments",
        r#"
        CREATE TABLE IF NOT EXISTS establishments (
            id SERIAL PRIMARY KEY,
            establishment_name TEXT NOT NULL,
            establishment_type_id INTEGER NOT NULL
                REFERENCES establishment_types(id) ON DELETE RESTRICT,
            site_id INTEGER NOT NULL REFERENCES sites(id) ON DELETE RESTRICT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "meters",
        r#"
        CREATE TABLE IF NOT EXISTS meters (
            id SERIAL PRIMARY KEY,
            serial_no TEXT NOT NULL,
            imei_no TEXT NOT NULL,
            client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE RESTRICT,
            establishment_id INTEGER REFERENCES establishments(id) ON DELETE SET NULL,
            operation_mode_id INTEGER NOT NULL
                REFERENCES operation_modes(id) ON DELETE RESTRICT,
            simcard TEXT NOT NULL,
            meter_type TEXT NOT NULL,
            meter_size TEXT NOT NULL,
            technology TEXT NOT NULL,
            valve_status TEXT NOT NULL DEFAULT 'open'
                CHECK (valve_status IN ('open', 'closed', 'offline')),
            latest_reading DOUBLE PRECISION NOT NULL DEFAULT 0
                CHECK (latest_reading >= 0),
            last_reading_time TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "billing_profiles",
        r#"
        CREATE TABLE IF NOT EXISTS billing_profiles (
            id SERIAL PRIMARY KEY,
            client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE RESTRICT,
            tariff TEXT NOT NULL,
            quota INTEGER NOT NULL CHECK (quota >= 0),
            automated_billing BOOLEAN NOT NULL DEFAULT FALSE,
            rate_kes DOUBLE PRECISION NOT NULL CHECK (rate_kes >= 0),
            rate_litres DOUBLE PRECISION NOT NULL CHECK (rate_litres > 0),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "mpesa_keys",
        r#"
        CREATE TABLE IF NOT EXISTS mpesa_keys (
            id SERIAL PRIMARY KEY,
            admin_id INTEGER NOT NULL REFERENCES admins(id) ON DELETE RESTRICT,
            account_type TEXT NOT NULL CHECK (account_type IN ('C2B', 'B2C')),
            consumer_key TEXT NOT NULL,
            business_account TEXT NOT NULL,
            consumer_secret TEXT NOT NULL,
            short_code TEXT NOT NULL,
            pass_key TEXT NOT NULL,
            initiator TEXT NOT NULL,
            security_credential TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "occupancies",
        r#"
        CREATE TABLE IF NOT EXISTS occupancies (
            id SERIAL PRIMARY KEY,
            establishment_id INTEGER NOT NULL
                REFERENCES establishments(id) ON DELETE RESTRICT,
            unit_number TEXT NOT NULL,
            customer_name TEXT,
            customer_phone TEXT,
            customer_email TEXT,
            meter_id INTEGER REFERENCES meters(id) ON DELETE SET NULL,
            status TEXT NOT NULL DEFAULT 'vacant'
                CHECK (status IN ('occupied', 'vacant')),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "transactions",
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id SERIAL PRIMARY KEY,
            meter_id INTEGER REFERENCES meters(id) ON DELETE SET NULL,
            amount DOUBLE PRECISION NOT NULL CHECK (amount >= 0),
            volume DOUBLE PRECISION NOT NULL CHECK (volume >= 0),
            status TEXT NOT NULL CHECK (status IN ('success', 'pending', 'failed')),
            reference TEXT,
            phone TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "events",
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id SERIAL PRIMARY KEY,
            event_type TEXT NOT NULL CHECK (event_type IN ('info', 'alert', 'valve')),
            description TEXT NOT NULL,
            meter_id INTEGER REFERENCES meters(id) ON DELETE SET NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
];

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("running migrations");

    for (table, ddl) in TABLES {
        sqlx::query(ddl).execute(pool).await?;
        tracing::debug!(table, "table ready");
    }

    create_indexes(pool).await?;

    tracing::info!(tables = TABLES.len(), "migrations complete");
    Ok(())
}

async fn create_indexes(pool: &PgPool) -> Result<(), DbError> {
    // Every foreign-key column gets an index; deletes on the parent scan it
    for fk in FOREIGN_KEYS {
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table}({column})",
            table = fk.table,
            column = fk.column,
        );
        sqlx::query(&sql).execute(pool).await?;
    }

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions(created_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_created_at ON events(created_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}
