//! The `Record` abstraction every table row implements
//!
//! A record knows its table, how its create/update inputs validate, and
//! which columns those inputs write. The store and the HTTP layer are
//! generic over it, so each resource only declares data.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::postgres::PgRow;
use sqlx::FromRow;

use super::ValidationError;

/// A typed SQL parameter. Nulls keep their type so PostgreSQL can infer
/// the parameter type on `INSERT`/`UPDATE`.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Option<String>),
    Int(Option<i32>),
    Float(Option<f64>),
    Bool(bool),
    Timestamp(Option<DateTime<Utc>>),
}

impl Column {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(Some(value.into()))
    }
}

/// Normalise and check user input.
pub trait Validate: Sized {
    fn validate(self) -> Result<Self, ValidationError>;
}

/// Column/value pairs an input writes, in declaration order.
pub trait Columns {
    fn columns(&self) -> Vec<(&'static str, Column)>;
}

/// A row of one table.
pub trait Record:
    Serialize
    + DeserializeOwned
    + Clone
    + Send
    + Sync
    + Unpin
    + for<'r> FromRow<'r, PgRow>
    + 'static
{
    /// SQL table name
    const TABLE: &'static str;

    /// Human label used in error messages and logs
    const RESOURCE: &'static str;

    /// Create payload
    type New: Validate + Columns + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Partial update payload
    type Patch: Validate + Columns + Serialize + DeserializeOwned + Default + Send + Sync + 'static;

    fn id(&self) -> i32;
}

/// Deserialize helper for patch fields that may be explicitly set to
/// `null`: absent stays `None`, `null` becomes `Some(None)`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Text enums stored as plain TEXT columns.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err($crate::models::ValidationError::InvalidVariant {
                        field: $field,
                        value: other.to_owned(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::models::ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for $crate::models::Column {
            fn from(value: $name) -> Self {
                $crate::models::Column::text(value.as_str())
            }
        }
    };
}

pub(crate) use text_enum;
