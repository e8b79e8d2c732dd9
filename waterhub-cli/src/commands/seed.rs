//! Insert reference data (operation modes, establishment types, default admin)

use anyhow::{Context, Result};
use clap::Parser;

use waterhub_server::db::{migrations, seed, Store};

use super::DatabaseArgs;

#[derive(Parser, Debug)]
pub struct SeedArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,
}

pub async fn run_seed(args: SeedArgs) -> Result<()> {
    let pool = args.db.connect().await?;
    migrations::run(&pool)
        .await
        .context("Failed to apply schema")?;

    let report = seed::run(&Store::postgres(pool))
        .await
        .context("Failed to seed reference data")?;

    if report.total() == 0 {
        println!("Reference data already present, nothing inserted");
    } else {
        println!(
            "Inserted {} operation modes, {} establishment types, {} admins",
            report.operation_modes, report.establishment_types, report.admins
        );
    }
    Ok(())
}
