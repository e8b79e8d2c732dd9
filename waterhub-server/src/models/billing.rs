//! Billing profiles: tariff and quota configuration per client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::record::{Column, Columns, Record, Validate};
use super::validation::{non_negative, patched, positive, required_text};
use super::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BillingProfile {
    pub id: i32,
    pub client_id: i32,
    pub tariff: String,
    /// Litres included per billing cycle
    pub quota: i32,
    pub automated_billing: bool,
    pub rate_kes: f64,
    pub rate_litres: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBillingProfile {
    pub client_id: i32,
    pub tariff: String,
    pub quota: i32,
    #[serde(default)]
    pub automated_billing: bool,
    pub rate_kes: f64,
    pub rate_litres: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tariff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automated_billing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_kes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_litres: Option<f64>,
}

fn quota(value: i32) -> Result<i32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative { field: "quota" });
    }
    Ok(value)
}

impl Validate for NewBillingProfile {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            tariff: required_text("tariff", &self.tariff)?,
            quota: quota(self.quota)?,
            rate_kes: non_negative("rateKes", self.rate_kes)?,
            rate_litres: positive("rateLitres", self.rate_litres)?,
            ..self
        })
    }
}

impl Columns for NewBillingProfile {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("client_id", Column::Int(Some(self.client_id))),
            ("tariff", Column::text(&self.tariff)),
            ("quota", Column::Int(Some(self.quota))),
            ("automated_billing", Column::Bool(self.automated_billing)),
            ("rate_kes", Column::Float(Some(self.rate_kes))),
            ("rate_litres", Column::Float(Some(self.rate_litres))),
        ]
    }
}

impl Validate for BillingProfilePatch {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            tariff: patched(&self.tariff, |v| required_text("tariff", v))?,
            quota: patched(&self.quota, |v| quota(*v))?,
            rate_kes: patched(&self.rate_kes, |v| non_negative("rateKes", *v))?,
            rate_litres: patched(&self.rate_litres, |v| positive("rateLitres", *v))?,
            ..self
        })
    }
}

impl Columns for BillingProfilePatch {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        let mut cols = Vec::new();
        if let Some(v) = self.client_id {
            cols.push(("client_id", Column::Int(Some(v))));
        }
        if let Some(v) = &self.tariff {
            cols.push(("tariff", Column::text(v)));
        }
        if let Some(v) = self.quota {
            cols.push(("quota", Column::Int(Some(v))));
        }
        if let Some(v) = self.automated_billing {
            cols.push(("automated_billing", Column::Bool(v)));
        }
        if let Some(v) = self.rate_kes {
            cols.push(("rate_kes", Column::Float(Some(v))));
        }
        if let Some(v) = self.rate_litres {
            cols.push(("rate_litres", Column::Float(Some(v))));
        }
        cols
    }
}

impl Record for BillingProfile {
    const TABLE: &'static str = "billing_profiles";
    const RESOURCE: &'static str = "billing profile";
    type New = NewBillingProfile;
    type Patch = BillingProfilePatch;

    fn id(&self) -> i32 {
        self.id
    }
}
