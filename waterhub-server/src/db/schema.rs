//! Foreign-key map of the schema
//!
//! Mirrors the `REFERENCES` clauses in [`super::migrations`]. The
//! PostgreSQL store uses it to name the offending field when a
//! constraint fires; the memory store enforces it directly.

/// What happens to children when the parent row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Restrict,
    SetNull,
}

#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    /// Child table
    pub table: &'static str,
    /// Child column
    pub column: &'static str,
    /// JSON field name of the column
    pub field: &'static str,
    /// Referenced table (always by `id`)
    pub parent: &'static str,
    pub on_delete: OnDelete,
}

impl ForeignKey {
    const fn restrict(
        table: &'static str,
        column: &'static str,
        field: &'static str,
        parent: &'static str,
    ) -> Self {
        Self {
            table,
            column,
            field,
            parent,
            on_delete: OnDelete::Restrict,
        }
    }

    const fn set_null(
        table: &'static str,
        column: &'static str,
        field: &'static str,
        parent: &'static str,
    ) -> Self {
        Self {
            table,
            column,
            field,
            parent,
            on_delete: OnDelete::SetNull,
        }
    }

    /// PostgreSQL's default constraint name for this key.
    pub fn constraint_name(&self) -> String {
        format!("{}_{}_fkey", self.table, self.column)
    }

    pub fn sql_action(&self) -> &'static str {
        match self.on_delete {
            OnDelete::Restrict => "RESTRICT",
            OnDelete::SetNull => "SET NULL",
        }
    }
}

pub const FOREIGN_KEYS: &[ForeignKey] = &[
    ForeignKey::restrict("sites", "client_id", "clientId", "clients"),
    ForeignKey::restrict(
        "establishments",
        "establishment_type_id",
        "establishmentTypeId",
        "establishment_types",
    ),
    ForeignKey::restrict("establishments", "site_id", "siteId", "sites"),
    ForeignKey::restrict("meters", "client_id", "clientId", "clients"),
    ForeignKey::set_null(
        "meters",
        "establishment_id",
        "establishmentId",
        "establishments",
    ),
    ForeignKey::restrict(
        "meters",
        "operation_mode_id",
        "operationModeId",
        "operation_modes",
    ),
    ForeignKey::restrict("billing_profiles", "client_id", "clientId", "clients"),
    ForeignKey::restrict("mpesa_keys", "admin_id", "adminId", "admins"),
    ForeignKey::restrict(
        "occupancies",
        "establishment_id",
        "establishmentId",
        "establishments",
    ),
    ForeignKey::set_null("occupancies", "meter_id", "meterId", "meters"),
    ForeignKey::set_null("transactions", "meter_id", "meterId", "meters"),
    ForeignKey::set_null("events", "meter_id", "meterId", "meters"),
];

/// Keys declared on `table`.
pub fn outgoing(table: &str) -> impl Iterator<Item = &'static ForeignKey> + '_ {
    FOREIGN_KEYS.iter().filter(move |fk| fk.table == table)
}

/// Keys pointing at `table`.
pub fn incoming(table: &str) -> impl Iterator<Item = &'static ForeignKey> + '_ {
    FOREIGN_KEYS.iter().filter(move |fk| fk.parent == table)
}

/// Look up a key by its constraint name.
pub fn by_constraint(name: &str) -> Option<&'static ForeignKey> {
    FOREIGN_KEYS.iter().find(|fk| fk.constraint_name() == name)
}
