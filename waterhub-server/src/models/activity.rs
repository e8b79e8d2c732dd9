//! Transactions and operator events: the dashboard activity feeds
//!
//! Neither is ever edited through the API; their patch types exist only
//! so they fit the generic store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::record::{text_enum, Column, Columns, Record, Validate};
use super::validation::{non_negative, optional_text, required_text};
use super::ValidationError;

text_enum!(
    TransactionStatus, "status" {
        Success => "success",
        Pending => "pending",
        Failed => "failed",
    }
);

text_enum!(
    EventType, "eventType" {
        Info => "info",
        Alert => "alert",
        Valve => "valve",
    }
);

/// A metered water purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i32,
    pub meter_id: Option<i32>,
    /// KES
    pub amount: f64,
    /// Litres
    pub volume: f64,
    #[sqlx(try_from = "String")]
    pub status: TransactionStatus,
    pub reference: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(default)]
    pub meter_id: Option<i32>,
    pub amount: f64,
    pub volume: f64,
    pub status: TransactionStatus,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionPatch {}

impl Validate for NewTransaction {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            amount: non_negative("amount", self.amount)?,
            volume: non_negative("volume", self.volume)?,
            reference: optional_text("reference", self.reference.as_deref())?,
            phone: optional_text("phone", self.phone.as_deref())?,
            ..self
        })
    }
}

impl Columns for NewTransaction {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("meter_id", Column::Int(self.meter_id)),
            ("amount", Column::Float(Some(self.amount))),
            ("volume", Column::Float(Some(self.volume))),
            ("status", self.status.into()),
            ("reference", Column::Text(self.reference.clone())),
            ("phone", Column::Text(self.phone.clone())),
        ]
    }
}

impl Validate for TransactionPatch {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(self)
    }
}

impl Columns for TransactionPatch {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        Vec::new()
    }
}

impl Record for Transaction {
    const TABLE: &'static str = "transactions";
    const RESOURCE: &'static str = "transaction";
    type New = NewTransaction;
    type Patch = TransactionPatch;

    fn id(&self) -> i32 {
        self.id
    }
}

/// An entry in the operator activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    #[sqlx(try_from = "String")]
    pub event_type: EventType,
    pub description: String,
    pub meter_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub event_type: EventType,
    pub description: String,
    #[serde(default)]
    pub meter_id: Option<i32>,
}

impl NewEvent {
    pub fn valve(meter_id: i32, serial_no: &str, status: super::ValveStatus) -> Self {
        Self {
            event_type: EventType::Valve,
            description: format!("Valve on meter {} set to {}", serial_no, status),
            meter_id: Some(meter_id),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {}

impl Validate for NewEvent {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            description: required_text("description", &self.description)?,
            ..self
        })
    }
}

impl Columns for NewEvent {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("event_type", self.event_type.into()),
            ("description", Column::text(&self.description)),
            ("meter_id", Column::Int(self.meter_id)),
        ]
    }
}

impl Validate for EventPatch {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(self)
    }
}

impl Columns for EventPatch {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        Vec::new()
    }
}

impl Record for Event {
    const TABLE: &'static str = "events";
    const RESOURCE: &'static str = "event";
    type New = NewEvent;
    type Patch = EventPatch;

    fn id(&self) -> i32 {
        self.id
    }
}
