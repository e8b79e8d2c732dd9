//! Occupancies (rentable units inside an establishment)

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use super::record::{nullable, text_enum, Column, Columns, Record, Validate};
use super::validation::{optional_email, optional_text, patched, required_text};
use super::ValidationError;

text_enum!(
    OccupancyStatus, "status" {
        Occupied => "occupied",
        Vacant => "vacant",
    }
);

impl Default for OccupancyStatus {
    fn default() -> Self {
        Self::Vacant
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Occupancy {
    pub id: i32,
    pub establishment_id: i32,
    pub unit_number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub meter_id: Option<i32>,
    #[sqlx(try_from = "String")]
    pub status: OccupancyStatus,
    pub created_at: DateTime<Utc>,
}

/// Occupancy row with the assigned meter's identity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyListing {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub occupancy: Occupancy,
    pub meter_serial: Option<String>,
    pub meter_technology: Option<String>,
}

/// Filters for occupancy listings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyFilter {
    #[serde(default)]
    pub establishment_id: Option<i32>,
    #[serde(default, deserialize_with = "status_or_all")]
    pub status: Option<OccupancyStatus>,
    #[serde(default)]
    pub search: Option<String>,
}

/// `?status=` accepts a status, `all`, or nothing.
fn status_or_all<'de, D>(deserializer: D) -> Result<Option<OccupancyStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

impl OccupancyFilter {
    /// Lowercased, non-blank search term.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// In-process form of the SQL predicate.
    pub fn matches(&self, listing: &OccupancyListing) -> bool {
        let o = &listing.occupancy;

        if self.establishment_id.is_some_and(|id| id != o.establishment_id) {
            return false;
        }
        if self.status.is_some_and(|s| s != o.status) {
            return false;
        }

        match self.search_term() {
            None => true,
            Some(term) => [
                Some(&o.unit_number),
                o.customer_name.as_ref(),
                o.customer_phone.as_ref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOccupancy {
    pub establishment_id: i32,
    pub unit_number: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub meter_id: Option<i32>,
    #[serde(default)]
    pub status: OccupancyStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub establishment_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_name: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_phone: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_email: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub meter_id: Option<Option<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OccupancyStatus>,
}

impl Validate for NewOccupancy {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            unit_number: required_text("unitNumber", &self.unit_number)?,
            customer_name: optional_text("customerName", self.customer_name.as_deref())?,
            customer_phone: optional_text("customerPhone", self.customer_phone.as_deref())?,
            customer_email: optional_email("customerEmail", self.customer_email.as_deref())?,
            ..self
        })
    }
}

impl Columns for NewOccupancy {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("establishment_id", Column::Int(Some(self.establishment_id))),
            ("unit_number", Column::text(&self.unit_number)),
            ("customer_name", Column::Text(self.customer_name.clone())),
            ("customer_phone", Column::Text(self.customer_phone.clone())),
            ("customer_email", Column::Text(self.customer_email.clone())),
            ("meter_id", Column::Int(self.meter_id)),
            ("status", self.status.into()),
        ]
    }
}

impl Validate for OccupancyPatch {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            unit_number: patched(&self.unit_number, |v| required_text("unitNumber", v))?,
            customer_name: patched(&self.customer_name, |v| {
                optional_text("customerName", v.as_deref())
            })?,
            customer_phone: patched(&self.customer_phone, |v| {
                optional_text("customerPhone", v.as_deref())
            })?,
            customer_email: patched(&self.customer_email, |v| {
                optional_email("customerEmail", v.as_deref())
            })?,
            ..self
        })
    }
}

impl Columns for OccupancyPatch {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        let mut cols = Vec::new();
        if let Some(v) = self.establishment_id {
            cols.push(("establishment_id", Column::Int(Some(v))));
        }
        if let Some(v) = &self.unit_number {
            cols.push(("unit_number", Column::text(v)));
        }
        if let Some(v) = &self.customer_name {
            cols.push(("customer_name", Column::Text(v.clone())));
        }
        if let Some(v) = &self.customer_phone {
            cols.push(("customer_phone", Column::Text(v.clone())));
        }
        if let Some(v) = &self.customer_email {
            cols.push(("customer_email", Column::Text(v.clone())));
        }
        if let Some(v) = self.meter_id {
            cols.push(("meter_id", Column::Int(v)));
        }
        if let Some(v) = self.status {
            cols.push(("status", v.into()));
        }
        cols
    }
}

impl Record for Occupancy {
    const TABLE: &'static str = "occupancies";
    const RESOURCE: &'static str = "occupancy";
    type New = NewOccupancy;
    type Patch = OccupancyPatch;

    fn id(&self) -> i32 {
        self.id
    }
}
