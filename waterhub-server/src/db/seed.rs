//! Reference data for a fresh database
//!
//! Each group is only inserted when its table is empty, so re-running
//! is harmless.

use super::store::{DbError, Store};
use crate::models::{
    Admin, EstablishmentType, NewContact, NewEstablishmentType, NewOperationMode, OperationMode,
};

const OPERATION_MODES: &[(&str, &str)] = &[
    ("Active", "Meter is fully operational"),
    ("Inactive", "Meter is temporarily disabled"),
    ("Maintenance", "Meter is under maintenance"),
];

const ESTABLISHMENT_TYPES: &[&str] = &["Residential", "Commercial", "Industrial"];

/// Rows inserted by a seed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub operation_modes: usize,
    pub establishment_types: usize,
    pub admins: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.operation_modes + self.establishment_types + self.admins
    }
}

pub fn default_admin() -> NewContact {
    NewContact {
        name: "Super Admin".into(),
        email: "admin@waterhub.com".into(),
        address: "HQ".into(),
        phone: "0700000000".into(),
    }
}

pub async fn run(store: &Store) -> Result<SeedReport, DbError> {
    let mut report = SeedReport::default();

    if store.count::<OperationMode>().await? == 0 {
        for (name, description) in OPERATION_MODES {
            store
                .insert::<OperationMode>(&NewOperationMode {
                    mode_name: (*name).into(),
                    mode_description: (*description).into(),
                })
                .await?;
            report.operation_modes += 1;
        }
    }

    if store.count::<EstablishmentType>().await? == 0 {
        for name in ESTABLISHMENT_TYPES {
            store
                .insert::<EstablishmentType>(&NewEstablishmentType {
                    type_name: (*name).into(),
                })
                .await?;
            report.establishment_types += 1;
        }
    }

    if store.count::<Admin>().await? == 0 {
        store.insert::<Admin>(&default_admin()).await?;
        report.admins += 1;
    }

    tracing::info!(
        operation_modes = report.operation_modes,
        establishment_types = report.establishment_types,
        admins = report.admins,
        "seed complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_once() {
        let store = Store::memory();

        let first = run(&store).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                operation_modes: 3,
                establishment_types: 3,
                admins: 1
            }
        );

        let second = run(&store).await.unwrap();
        assert_eq!(second.total(), 0);

        let modes = store.list::<OperationMode>().await.unwrap();
        let names: Vec<_> = modes.iter().map(|m| m.mode_name.as_str()).collect();
        assert_eq!(names, ["Active", "Inactive", "Maintenance"]);
        assert_eq!(modes[1].mode_description, "Meter is temporarily disabled");

        let admin = store.get::<Admin>(1).await.unwrap();
        assert_eq!(admin.email, "admin@waterhub.com");
    }
}
