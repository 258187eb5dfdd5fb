//! Per-field validation errors
//!
//! Services collect every problem with a submitted form before giving up, so
//! the page can show all of them next to the offending fields at once.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Validation messages keyed by form field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error on one field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append every message from `other`
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            let entry = self.0.entry(field).or_default();
            for message in messages {
                if !entry.contains(&message) {
                    entry.push(message);
                }
            }
        }
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
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Shared check for required text fields with a maximum length
pub(crate) fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
    } else if value.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this value has at most {} characters.", max_len),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_messages_per_field() {
        let mut errors = FieldErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.add("title", "This field is required.");
        errors.add("title", "Too short.");
        errors.add("text", "This field is required.");

        assert!(errors.has("title"));
        assert_eq!(errors.get("title").len(), 2);
        assert!(errors.get("image").is_empty());
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_check_text() {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "a", "   ", 10);
        check_text(&mut errors, "b", "ok", 10);
        check_text(&mut errors, "c", "ééééé", 4);

        assert!(errors.has("a"));
        assert!(!errors.has("b"));
        assert_eq!(
            errors.get("c"),
            ["Ensure this value has at most 4 characters.".to_string()]
        );
    }

    #[test]
    fn test_merge_skips_duplicates() {
        let mut errors = FieldErrors::single("pub_date", "Enter a valid date/time.");
        let mut other = FieldErrors::single("title", "This field is required.");
        other.add("pub_date", "Enter a valid date/time.");
        errors.merge(other);

        assert_eq!(errors.get("pub_date").len(), 1);
        assert!(errors.has("title"));
    }

    #[test]
    fn test_serializes_as_map() {
        let errors = FieldErrors::single("text", "Required");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["text"][0], "Required");
    }
}
