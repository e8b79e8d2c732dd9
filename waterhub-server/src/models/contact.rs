//! Admins and clients
//!
//! Both tables share the same contact shape (name, email, address,
//! phone), so they share their input types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::record::{Column, Columns, Record, Validate};
use super::validation::{email, patched, required_text};
use super::ValidationError;

/// Back-office operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// Landlord or business owning sites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Validate for NewContact {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", &self.name)?,
            email: email("email", &self.email)?,
            address: required_text("address", &self.address)?,
            phone: required_text("phone", &self.phone)?,
        })
    }
}

impl Columns for NewContact {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("name", Column::text(&self.name)),
            ("email", Column::text(&self.email)),
            ("address", Column::text(&self.address)),
            ("phone", Column::text(&self.phone)),
        ]
    }
}

impl Validate for ContactPatch {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: patched(&self.name, |v| required_text("name", v))?,
            email: patched(&self.email, |v| email("email", v))?,
            address: patched(&self.address, |v| required_text("address", v))?,
            phone: patched(&self.phone, |v| required_text("phone", v))?,
        })
    }
}

impl Columns for ContactPatch {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        let mut cols = Vec::new();
        if let Some(v) = &self.name {
            cols.push(("name", Column::text(v)));
        }
        if let Some(v) = &self.email {
            cols.push(("email", Column::text(v)));
        }
        if let Some(v) = &self.address {
            cols.push(("address", Column::text(v)));
        }
        if let Some(v) = &self.phone {
            cols.push(("phone", Column::text(v)));
        }
        cols
    }
}

impl Record for Admin {
    const TABLE: &'static str = "admins";
    const RESOURCE: &'static str = "admin";
    type New = NewContact;
    type Patch = ContactPatch;

    fn id(&self) -> i32 {
        self.id
    }
}

impl Record for Client {
    const TABLE: &'static str = "clients";
    const RESOURCE: &'static str = "client";
    type New = NewContact;
    type Patch = ContactPatch;

    fn id(&self) -> i32 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> NewContact {
        NewContact {
            name: " Jane Wanjiku ".into(),
            email: "jane@example.com".into(),
            address: "Kilimani".into(),
            phone: "0712345678".into(),
        }
    }

    #[test]
    fn new_contact_is_trimmed() {
        let c = contact().validate().unwrap();
        assert_eq!(c.name, "Jane Wanjiku");
        assert_eq!(c.columns().len(), 4);
    }

    #[test]
    fn new_contact_rejects_bad_email() {
        let err = NewContact {
            email: "jane".into(),
            ..contact()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field(), Some("email"));
    }

    #[test]
    fn patch_only_writes_supplied_fields() {
        let patch = ContactPatch {
            phone: Some("0799000000".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(patch.columns(), vec![("phone", Column::text("0799000000"))]);
    }

    #[test]
    fn patch_rejects_blank_name() {
        let err = ContactPatch {
            name: Some("   ".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ValidationError::Empty { field: "name" }));
    }
}
