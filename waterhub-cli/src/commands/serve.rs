//! HTTP server command
//!
//! Connects to PostgreSQL (or an in-memory store with `--memory`), brings
//! the schema up to date, seeds reference data and serves the REST API.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use waterhub_server::db::{migrations, seed, Store};
use waterhub_server::http::{run_server, ServerConfig};

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "WATERHUB_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Keep everything in process memory instead of PostgreSQL
    #[arg(long)]
    pub memory: bool,

    /// Skip inserting reference data on startup
    #[arg(long)]
    pub no_seed: bool,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let store = if args.memory {
        tracing::warn!("in-memory store: data is lost on shutdown");
        Store::memory()
    } else {
        let pool = args.db.connect().await?;
        migrations::run(&pool)
            .await
            .context("Failed to apply schema")?;
        Store::postgres(pool)
    };

    if !args.no_seed {
        seed::run(&store)
            .await
            .context("Failed to seed reference data")?;
    }

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
    };

    run_server(store, config).await.context("Server error")?;
    Ok(())
}
