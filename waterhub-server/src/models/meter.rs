//! Water meters and valve state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::record::{nullable, text_enum, Column, Columns, Record, Validate};
use super::validation::{non_negative, patched, required_text};
use super::ValidationError;

text_enum!(
    /// Remote valve position reported for a meter
    ValveStatus, "valveStatus" {
        Open => "open",
        Closed => "closed",
        Offline => "offline",
    }
);

impl Default for ValveStatus {
    fn default() -> Self {
        Self::Open
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Meter {
    pub id: i32,
    pub serial_no: String,
    pub imei_no: String,
    pub client_id: i32,
    pub establishment_id: Option<i32>,
    pub operation_mode_id: i32,
    pub simcard: String,
    #[serde(rename = "type")]
    pub meter_type: String,
    pub meter_size: String,
    pub technology: String,
    #[sqlx(try_from = "String")]
    pub valve_status: ValveStatus,
    /// Litres
    pub latest_reading: f64,
    pub last_reading_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Meter row plus the tenant currently holding it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MeterListing {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub meter: Meter,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeter {
    pub serial_no: String,
    pub imei_no: String,
    pub client_id: i32,
    #[serde(default)]
    pub establishment_id: Option<i32>,
    pub operation_mode_id: i32,
    pub simcard: String,
    #[serde(rename = "type")]
    pub meter_type: String,
    pub meter_size: String,
    pub technology: String,
    #[serde(default)]
    pub valve_status: ValveStatus,
    #[serde(default)]
    pub latest_reading: f64,
    #[serde(default)]
    pub last_reading_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imei_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i32>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub establishment_id: Option<Option<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_mode_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simcard: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub meter_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meter_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valve_status: Option<ValveStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_reading: Option<f64>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_reading_time: Option<Option<DateTime<Utc>>>,
}

impl MeterPatch {
    /// Patch that only moves the valve.
    pub fn valve(status: ValveStatus) -> Self {
        Self {
            valve_status: Some(status),
            ..Default::default()
        }
    }
}

impl Validate for NewMeter {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            serial_no: required_text("serialNo", &self.serial_no)?,
            imei_no: required_text("imeiNo", &self.imei_no)?,
            simcard: required_text("simcard", &self.simcard)?,
            meter_type: required_text("type", &self.meter_type)?,
            meter_size: required_text("meterSize", &self.meter_size)?,
            technology: required_text("technology", &self.technology)?,
            latest_reading: non_negative("latestReading", self.latest_reading)?,
            ..self
        })
    }
}

impl Columns for NewMeter {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("serial_no", Column::text(&self.serial_no)),
            ("imei_no", Column::text(&self.imei_no)),
            ("client_id", Column::Int(Some(self.client_id))),
            ("establishment_id", Column::Int(self.establishment_id)),
            ("operation_mode_id", Column::Int(Some(self.operation_mode_id))),
            ("simcard", Column::text(&self.simcard)),
            ("meter_type", Column::text(&self.meter_type)),
            ("meter_size", Column::text(&self.meter_size)),
            ("technology", Column::text(&self.technology)),
            ("valve_status", self.valve_status.into()),
            ("latest_reading", Column::Float(Some(self.latest_reading))),
            ("last_reading_time", Column::Timestamp(self.last_reading_time)),
        ]
    }
}

impl Validate for MeterPatch {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            serial_no: patched(&self.serial_no, |v| required_text("serialNo", v))?,
            imei_no: patched(&self.imei_no, |v| required_text("imeiNo", v))?,
            simcard: patched(&self.simcard, |v| required_text("simcard", v))?,
            meter_type: patched(&self.meter_type, |v| required_text("type", v))?,
            meter_size: patched(&self.meter_size, |v| required_text("meterSize", v))?,
            technology: patched(&self.technology, |v| required_text("technology", v))?,
            latest_reading: patched(&self.latest_reading, |v| {
                non_negative("latestReading", *v)
            })?,
            ..self
        })
    }
}

impl Columns for MeterPatch {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        let mut cols = Vec::new();
        if let Some(v) = &self.serial_no {
            cols.push(("serial_no", Column::text(v)));
        }
        if let Some(v) = &self.imei_no {
            cols.push(("imei_no", Column::text(v)));
        }
        if let Some(v) = self.client_id {
            cols.push(("client_id", Column::Int(Some(v))));
        }
        if let Some(v) = self.establishment_id {
            cols.push(("establishment_id", Column::Int(v)));
        }
        if let Some(v) = self.operation_mode_id {
            cols.push(("operation_mode_id", Column::Int(Some(v))));
        }
        if let Some(v) = &self.simcard {
            cols.push(("simcard", Column::text(v)));
        }
        if let Some(v) = &self.meter_type {
            cols.push(("meter_type", Column::text(v)));
        }
        if let Some(v) = &self.meter_size {
            cols.push(("meter_size", Column::text(v)));
        }
        if let Some(v) = &self.technology {
            cols.push(("technology", Column::text(v)));
        }
        if let Some(v) = self.valve_status {
            cols.push(("valve_status", v.into()));
        }
        if let Some(v) = self.latest_reading {
            cols.push(("latest_reading", Column::Float(Some(v))));
        }
        if let Some(v) = self.last_reading_time {
            cols.push(("last_reading_time", Column::Timestamp(v)));
        }
        cols
    }
}

impl Record for Meter {
    const TABLE: &'static str = "meters";
    const RESOURCE: &'static str = "meter";
    type New = NewMeter;
    type Patch = MeterPatch;

    fn id(&self) -> i32 {
        self.id
    }
}

/// Body of `PATCH /api/meters/{id}/valve`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValveRequest {
    pub status: ValveStatus,
}

impl Validate for ValveRequest {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(self)
    }
}
