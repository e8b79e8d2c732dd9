//! Validation error types and field rules shared by every input model

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Loose address check: one `@`, no whitespace, a dot in the domain.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex")
});

/// Validation error for domain models
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// String doesn't match required format
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Numeric field below zero
    Negative { field: &'static str },

    /// Numeric field must be strictly above zero
    NotPositive { field: &'static str },

    /// Request body could not be decoded
    Malformed { reason: String },
}

impl ValidationError {
    /// Name of the offending field, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Empty { field }
            | Self::InvalidFormat { field, .. }
            | Self::InvalidVariant { field, .. }
            | Self::Negative { field }
            | Self::NotPositive { field } => Some(*field),
            Self::Malformed { .. } => None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::Negative { field } => write!(f, "{} cannot be negative", field),
            Self::NotPositive { field } => write!(f, "{} must be greater than zero", field),
            Self::Malformed { reason } => write!(f, "{}", reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Trim a required text field and check it is non-empty.
pub fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    Ok(trimmed.to_owned())
}

/// Optional text: blank collapses to `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => required_text(field, s).map(Some),
    }
}

/// Required email address.
pub fn email(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = required_text(field, value)?;

    if !EMAIL_RE.is_match(&value) {
        return Err(ValidationError::InvalidFormat {
            field,
            reason: "must be a valid email address",
        });
    }

    Ok(value)
}

/// Optional email address; an empty string means "none".
pub fn optional_email(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => email(field, s).map(Some),
    }
}

/// Reject negative (or NaN) numbers.
pub fn non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_nan() || value < 0.0 {
        return Err(ValidationError::Negative { field });
    }
    Ok(value)
}

/// Strictly positive number.
pub fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_nan() || value <= 0.0 {
        return Err(ValidationError::NotPositive { field });
    }
    Ok(value)
}

/// Apply a rule to a patch field only when it was supplied.
pub fn patched<T, U>(
    value: &Option<T>,
    rule: impl FnOnce(&T) -> Result<U, ValidationError>,
) -> Result<Option<U>, ValidationError> {
    value.as_ref().map(rule).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::Empty { field: "name" };
        assert_eq!(err.to_string(), "name cannot be empty");
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("name", "  Jane  ").unwrap(), "Jane");
        assert_eq!(
            required_text("name", "   ").unwrap_err(),
            ValidationError::Empty { field: "name" }
        );
    }

    #[test]
    fn required_text_has_no_length_cap() {
        // Daraja security credentials are 344-char base64
        let credential = format!("{}==", "A".repeat(342));
        assert_eq!(
            required_text("securityCredential", &credential).unwrap(),
            credential
        );
    }

    #[test]
    fn optional_text_blank_is_none() {
        assert_eq!(optional_text("customerName", Some("  ")).unwrap(), None);
        assert_eq!(optional_text("customerName", None).unwrap(), None);
        assert_eq!(
            optional_text("customerName", Some("Grace")).unwrap(),
            Some("Grace".to_string())
        );
    }

    #[test]
    fn email_format() {
        assert!(email("email", "admin@waterhub.com").is_ok());
        assert!(matches!(
            email("email", "not-an-email").unwrap_err(),
            ValidationError::InvalidFormat { field: "email", .. }
        ));
        assert!(matches!(
            email("email", "a b@c.d").unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
    }

    #[test]
    fn optional_email_accepts_empty() {
        assert_eq!(optional_email("customerEmail", Some("")).unwrap(), None);
        assert!(optional_email("customerEmail", Some("nope")).is_err());
    }

    #[test]
    fn negative_numbers_rejected() {
        assert!(non_negative("quota", 0.0).is_ok());
        assert_eq!(
            non_negative("quota", -1.0).unwrap_err(),
            ValidationError::Negative { field: "quota" }
        );
        assert!(non_negative("quota", f64::NAN).is_err());
    }

    #[test]
    fn zero_is_not_positive() {
        assert!(positive("rateLitres", 0.5).is_ok());
        assert_eq!(
            positive("rateLitres", 0.0).unwrap_err().to_string(),
            "rateLitres must be greater than zero"
        );
    }
}
