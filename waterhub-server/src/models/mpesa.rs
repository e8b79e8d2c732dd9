//! M-PESA API credential sets, one or more per admin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::record::{text_enum, Column, Columns, Record, Validate};
use super::validation::{patched, required_text};
use super::ValidationError;

text_enum!(
    /// Direction of the Daraja integration
    AccountType, "accountType" {
        C2b => "C2B",
        B2c => "B2C",
    }
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MpesaKey {
    pub id: i32,
    pub admin_id: i32,
    #[sqlx(try_from = "String")]
    pub account_type: AccountType,
    pub consumer_key: String,
    pub business_account: String,
    pub consumer_secret: String,
    pub short_code: String,
    pub pass_key: String,
    pub initiator: String,
    pub security_credential: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMpesaKey {
    pub admin_id: i32,
    pub account_type: AccountType,
    pub consumer_key: String,
    pub business_account: String,
    pub consumer_secret: String,
    pub short_code: String,
    pub pass_key: String,
    pub initiator: String,
    pub security_credential: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MpesaKeyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_credential: Option<String>,
}

impl Validate for NewMpesaKey {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            consumer_key: required_text("consumerKey", &self.consumer_key)?,
            business_account: required_text("businessAccount", &self.business_account)?,
            consumer_secret: required_text("consumerSecret", &self.consumer_secret)?,
            short_code: required_text("shortCode", &self.short_code)?,
            pass_key: required_text("passKey", &self.pass_key)?,
            initiator: required_text("initiator", &self.initiator)?,
            security_credential: required_text(
                "securityCredential",
                &self.security_credential,
            )?,
            ..self
        })
    }
}

impl Columns for NewMpesaKey {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("admin_id", Column::Int(Some(self.admin_id))),
            ("account_type", self.account_type.into()),
            ("consumer_key", Column::text(&self.consumer_key)),
            ("business_account", Column::text(&self.business_account)),
            ("consumer_secret", Column::text(&self.consumer_secret)),
            ("short_code", Column::text(&self.short_code)),
            ("pass_key", Column::text(&self.pass_key)),
            ("initiator", Column::text(&self.initiator)),
            ("security_credential", Column::text(&self.security_credential)),
        ]
    }
}

impl Validate for MpesaKeyPatch {
    fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            consumer_key: patched(&self.consumer_key, |v| required_text("consumerKey", v))?,
            business_account: patched(&self.business_account, |v| {
                required_text("businessAccount", v)
            })?,
            consumer_secret: patched(&self.consumer_secret, |v| {
                required_text("consumerSecret", v)
            })?,
            short_code: patched(&self.short_code, |v| required_text("shortCode", v))?,
            pass_key: patched(&self.pass_key, |v| required_text("passKey", v))?,
            initiator: patched(&self.initiator, |v| required_text("initiator", v))?,
            security_credential: patched(&self.security_credential, |v| {
                required_text("securityCredential", v)
            })?,
            ..self
        })
    }
}

impl Columns for MpesaKeyPatch {
    fn columns(&self) -> Vec<(&'static str, Column)> {
        let mut cols = Vec::new();
        if let Some(v) = self.admin_id {
            cols.push(("admin_id", Column::Int(Some(v))));
        }
        if let Some(v) = self.account_type {
            cols.push(("account_type", v.into()));
        }
        let texts = [
            ("consumer_key", &self.consumer_key),
            ("business_account", &self.business_account),
            ("consumer_secret", &self.consumer_secret),
            ("short_code", &self.short_code),
            ("pass_key", &self.pass_key),
            ("initiator", &self.initiator),
            ("security_credential", &self.security_credential),
        ];
        for (name, value) in texts {
            if let Some(v) = value {
                cols.push((name, Column::text(v)));
            }
        }
        cols
    }
}

impl Record for MpesaKey {
    const TABLE: &'static str = "mpesa_keys";
    const RESOURCE: &'static str = "mpesa key";
    type New = NewMpesaKey;
    type Patch = MpesaKeyPatch;

    fn id(&self) -> i32 {
        self.id
    }
}
