//! Sites, operation modes and establishment types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::record::{Column, Columns, Record, Validate};
use super::validation::{patched, required_text};
use super::ValidationError;

/// A physical location owned by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: i32,
    pub site_name: String,
    pub client_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSite {
    pub site_name: String,
    pub client_id: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i32>,
}

impl Validate for NewSite {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            site_name: required_text("siteName", &self.site_name)?,
            client_id: self.client_id,
        })
    }
}

impl Columns for NewSite {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("site_name", Column::text(&self.site_name)),
            ("client_id", Column::Int(Some(self.client_id))),
        ]
    }
}

impl Validate for SitePatch {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            site_name: patched(&self.site_name, |v| required_text("siteName", v))?,
            client_id: self.client_id,
        })
    }
}

impl Columns for SitePatch {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        let mut cols = Vec::new();
        if let Some(v) = &self.site_name {
            cols.push(("site_name", Column::text(v)));
        }
        if let Some(v) = self.client_id {
            cols.push(("client_id", Column::Int(Some(v))));
        }
        cols
    }
}

impl Record for Site {
    const TABLE: &'static str = "sites";
    const RESOURCE: &'static str = "site";
    type New = NewSite;
    type Patch = SitePatch;

    fn id(&self) -> i32 {
        self.id
    }
}

/// How a meter is being run (Active, Inactive, Maintenance, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OperationMode {
    pub id: i32,
    pub mode_name: String,
    pub mode_description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOperationMode {
    pub mode_name: String,
    pub mode_description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationModePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_description: Option<String>,
}

impl Validate for NewOperationMode {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            mode_name: required_text("modeName", &self.mode_name)?,
            mode_description: required_text("modeDescription", &self.mode_description)?,
        })
    }
}

impl Columns for NewOperationMode {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("mode_name", Column::text(&self.mode_name)),
            ("mode_description", Column::text(&self.mode_description)),
        ]
    }
}

impl Validate for OperationModePatch {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            mode_name: patched(&self.mode_name, |v| required_text("modeName", v))?,
            mode_description: patched(&self.mode_description, |v| {
                required_text("modeDescription", v)
            })?,
        })
    }
}

impl Columns for OperationModePatch {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        let mut cols = Vec::new();
        if let Some(v) = &self.mode_name {
            cols.push(("mode_name", Column::text(v)));
        }
        if let Some(v) = &self.mode_description {
            cols.push(("mode_description", Column::text(v)));
        }
        cols
    }
}

impl Record for OperationMode {
    const TABLE: &'static str = "operation_modes";
    const RESOURCE: &'static str = "operation mode";
    type New = NewOperationMode;
    type Patch = OperationModePatch;

    fn id(&self) -> i32 {
        self.id
    }
}

/// Building category (Residential, Commercial, Industrial, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentType {
    pub id: i32,
    pub type_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEstablishmentType {
    pub type_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentTypePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl Validate for NewEstablishmentType {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            type_name: required_text("typeName", &self.type_name)?,
        })
    }
}

impl Columns for NewEstablishmentType {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![("type_name", Column::text(&self.type_name))]
    }
}

impl Validate for EstablishmentTypePatch {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            type_name: patched(&self.type_name, |v| required_text("typeName", v))?,
        })
    }
}

impl Columns for EstablishmentTypePatch {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        self.type_name
            .iter()
            .map(|v| ("type_name", Column::text(v)))
            .collect()
    }
}

impl Record for EstablishmentType {
    const TABLE: &'static str = "establishment_types";
    const RESOURCE: &'static str = "establishment type";
    type New = NewEstablishmentType;
    type Patch = EstablishmentTypePatch;

    fn id(&self) -> i32 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_name_required() {
        let err = NewSite {
            site_name: "".into(),
            client_id: 1,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field(), Some("siteName"));
    }

    #[test]
    fn site_patch_columns() {
        let patch = SitePatch {
            client_id: Some(7),
            ..Default::default()
        };
        assert_eq!(patch.columns(), vec![("client_id", Column::Int(Some(7)))]);
    }

    #[test]
    fn operation_mode_requires_description() {
        let err = NewOperationMode {
            mode_name: "Active".into(),
            mode_description: " ".into(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field(), Some("modeDescription"));
    }

    #[test]
    fn establishment_type_patch_empty() {
        assert!(EstablishmentTypePatch::default().columns().is_empty());
    }
}
