//! Credential masking for logged payloads

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const MASK: &str = "***";

static SENSITIVE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)password|token|secret|credential|passkey|consumerkey|api_?key")
        .expect("invalid redaction regex")
});

pub fn is_sensitive(key: &str) -> bool {
    SENSITIVE_KEY.is_match(key)
}

/// Replace every value under a sensitive key with `"***"`, at any depth.
pub fn redact(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let v = if is_sensitive(&k) {
                        Value::String(MASK.to_owned())
                    } else {
                        redact(v)
                    };
                    (k, v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_mpesa_credentials() {
        let out = redact(json!({
            "adminId": 1,
            "consumerKey": "ck",
            "consumerSecret": "cs",
            "passKey": "pk",
            "securityCredential": "sc",
            "shortCode": "174379"
        }));
        assert_eq!(
            out,
            json!({
                "adminId": 1,
                "consumerKey": "***",
                "consumerSecret": "***",
                "passKey": "***",
                "securityCredential": "***",
                "shortCode": "174379"
            })
        );
    }

    #[test]
    fn nested_and_case_insensitive() {
        let out = redact(json!({
            "items": [{ "API_KEY": "x", "name": "a" }],
            "auth": { "Token": 5, "apikey": null }
        }));
        assert_eq!(out["items"][0]["API_KEY"], "***");
        assert_eq!(out["items"][0]["name"], "a");
        assert_eq!(out["auth"]["Token"], "***");
        assert_eq!(out["auth"]["apikey"], "***");
    }

    #[test]
    fn scalars_untouched() {
        assert_eq!(redact(json!("secret")), json!("secret"));
        assert!(!is_sensitive("customerName"));
    }
}
