//! Establishments (buildings within a site)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::record::{Column, Columns, Record, Validate};
use super::validation::{patched, required_text};
use super::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Establishment {
    pub id: i32,
    pub establishment_name: String,
    pub establishment_type_id: i32,
    pub site_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEstablishment {
    pub establishment_name: String,
    pub establishment_type_id: i32,
    pub site_id: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub establishment_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub establishment_type_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

impl Validate for NewEstablishment {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            establishment_name: required_text("establishmentName", &self.establishment_name)?,
            ..self
        })
    }
}

impl Columns for NewEstablishment {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("establishment_name", Column::text(&self.establishment_name)),
            (
                "establishment_type_id",
                Column::Int(Some(self.establishment_type_id)),
            ),
            ("site_id", Column::Int(Some(self.site_id))),
        ]
    }
}

impl Validate for EstablishmentPatch {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            establishment_name: patched(&self.establishment_name, |v| {
                required_text("establishmentName", v)
            })?,
            ..self
        })
    }
}

impl Columns for EstablishmentPatch {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        let mut cols = Vec::new();
        if let Some(v) = &self.establishment_name {
            cols.push(("establishment_name", Column::text(v)));
        }
        if let Some(v) = self.establishment_type_id {
            cols.push(("establishment_type_id", Column::Int(Some(v))));
        }
        if let Some(v) = self.site_id {
            cols.push(("site_id", Column::Int(Some(v))));
        }
        cols
    }
}

impl Record for Establishment {
    const TABLE: &'static str = "establishments";
    const RESOURCE: &'static str = "establishment";
    type New = NewEstablishment;
    type Patch = EstablishmentPatch;

    fn id(&self) -> i32 {
        self.id
    }
}
