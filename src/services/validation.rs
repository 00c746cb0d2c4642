//! Field-level validation errors
//!
//! Services collect every problem with a submission before failing, keyed
//! by field name. Problems that do not belong to one field go under
//! `NON_FIELD_ERRORS`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Key for errors that are not tied to a single field
pub const NON_FIELD_ERRORS: &str = "__all__";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Check the shape of an email address
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Check for an absolute http(s) URL with a host
pub fn is_valid_url(url: &str) -> bool {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !rest.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Validation messages keyed by field
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-error shortcut
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    /// Record "This field is required." when the value is blank
    pub fn require(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
            false
        } else {
            true
        }
    }

    /// Record a length error when the value has more than `max` characters
    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        let len = value.chars().count();
        if len > max {
            self.add(
                field,
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max, len
                ),
            );
        }
    }

    /// Required field holding an email address
    pub fn email(&mut self, field: &str, value: &str) {
        if self.require(field, value) && !is_valid_email(value) {
            self.add(field, "Enter a valid email address.");
        }
    }

    /// Optional field holding a URL
    pub fn url(&mut self, field: &str, value: &str) {
        if !value.trim().is_empty() && !is_valid_url(value) {
            self.add(field, "Enter a valid URL.");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| {
                if field == NON_FIELD_ERRORS {
                    messages.join(" ")
                } else {
                    format!("{}: {}", field, messages.join(" "))
                }
            })
            .collect();
        f.write_str(&parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("jo@example.com"));
        assert!(is_valid_email(" jo.doe+tag@mail.example.org "));
        assert!(!is_valid_email("jo@example"));
        assert!(!is_valid_email("jo example@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_url_shape() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://example.com/path?q=1"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("https://"));
        assert!(!is_valid_url("example.com"));
    }

    #[test]
    fn test_collects_every_problem() {
        let mut errors = FieldErrors::new();
        errors.require("username", "  ");
        errors.email("email", "nope");
        errors.max_len("first_name", &"x".repeat(51), 50);
        errors.url("website", "");

        assert!(errors.contains("username"));
        assert_eq!(errors.get("email").unwrap(), ["Enter a valid email address."]);
        assert_eq!(
            errors.get("first_name").unwrap(),
            ["Ensure this value has at most 50 characters (it has 51)."]
        );
        assert!(!errors.contains("website"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_display_and_json() {
        let mut errors = FieldErrors::single(NON_FIELD_ERRORS, "Passwords do not match.");
        errors.add("email", "Enter a valid email address.");

        assert_eq!(
            errors.to_string(),
            "Passwords do not match.; email: Enter a valid email address."
        );
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["email"][0], "Enter a valid email address.");
    }

    #[test]
    fn test_empty_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
