//! Command implementations for the waterhub CLI

pub mod migrate;
pub mod seed;
pub mod serve;

use anyhow::{Context, Result};
use clap::Args;
use waterhub_server::db::{create_pool_with_options, pool::DEFAULT_MAX_CONNECTIONS, PgPool};

pub use migrate::run_migrate;
pub use seed::run_seed;
pub use serve::run_serve;

/// PostgreSQL connection flags shared by every command
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Upper bound on pooled connections
    #[arg(long, env = "WATERHUB_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}

impl DatabaseArgs {
    pub async fn connect(&self) -> Result<PgPool> {
        let url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or .env")?;

        create_pool_with_options(url, self.max_connections)
            .await
            .context("Failed to create database pool")
    }
}
