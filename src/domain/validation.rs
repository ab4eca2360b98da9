//! Field-level validation primitives shared by every resource.
//!
//! Validation is accumulate-then-report: rules record their failures in a
//! [`FieldErrors`] map and the caller decides once, after every field has
//! been checked, whether the write may proceed.

use std::collections::BTreeMap;

use chrono::{Datelike, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;

/// Message recorded for a required field missing from a create or full update.
pub const REQUIRED: &str = "This field is required.";

/// Message recorded for a text field that is empty or whitespace only.
pub const BLANK: &str = "This field may not be blank.";

/// Message recorded for a field whose JSON value is not an integer.
pub const INVALID_INTEGER: &str = "A valid integer is required.";

/// Message recorded for a field whose JSON value is not a string.
pub const INVALID_STRING: &str = "Not a valid string.";

/// Field name → ordered list of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Key for errors that belong to the payload as a whole.
    pub const NON_FIELD: &'static str = "non_field_errors";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
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

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Folds the errors reported by a `#[derive(Validate)]` payload into this map.
    pub fn merge_validator(&mut self, errors: &validator::ValidationErrors) {
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                self.add(field.to_string(), message);
            }
        }
    }

    /// Adds the first message of every field in `other` that has no error yet.
    ///
    /// Rules run in a fixed order per field and only the first failure is reported.
    pub fn absorb_first(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            if self.0.contains_key(&field) {
                continue;
            }
            if let Some(first) = messages.into_iter().next() {
                self.add(field, first);
            }
        }
    }
}

/// Inputs to validation that depend on when the write happens.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    pub current_year: i32,
}

impl ValidationContext {
    /// Captures the current UTC year.
    pub fn now() -> Self {
        Self {
            current_year: Utc::now().year(),
        }
    }
}

/// Decodes a JSON request body into a write payload.
///
/// An empty body is an empty object. Syntax errors and non-object bodies are
/// reported under `non_field_errors`; values of the wrong type are reported
/// per field. Every field of `T` must be optional, since each supplied field
/// is re-checked on its own to attribute type errors.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the body cannot become a `T`.
pub fn decode_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice::<Value>(body)
            .map_err(|e| AppError::bad_request(format!("JSON parse error - {e}")))?
    };

    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(AppError::bad_request(format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_kind(&other)
            )));
        }
    };

    let error = match serde_json::from_value::<T>(Value::Object(fields.clone())) {
        Ok(input) => return Ok(input),
        Err(error) => error,
    };

    let mut errors = FieldErrors::new();
    for (name, value) in fields {
        let mut single = Map::new();
        single.insert(name.clone(), value);
        if let Err(field_error) = serde_json::from_value::<T>(Value::Object(single)) {
            errors.add(name, type_message(&field_error));
        }
    }

    if errors.is_empty() {
        Err(AppError::bad_request(error.to_string()))
    } else {
        Err(AppError::validation(errors))
    }
}

fn type_message(error: &serde_json::Error) -> &'static str {
    let text = error.to_string();
    if text.contains("expected i") || text.contains("expected u") {
        INVALID_INTEGER
    } else if text.contains("expected a string") {
        INVALID_STRING
    } else {
        "Invalid value."
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Records [`BLANK`] when `value` has no visible characters.
pub fn check_not_blank(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
    }
}

/// Rejects publication years after the year the write is validated in.
pub fn check_publication_year(errors: &mut FieldErrors, year: i32, ctx: &ValidationContext) {
    if year > ctx.current_year {
        errors.add(
            "publication_year",
            format!(
                "Publication year {} cannot be in the future (current year is {}).",
                year, ctx.current_year
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Debug, serde::Deserialize)]
    struct Payload {
        title: Option<String>,
        year: Option<i32>,
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(max = 3, message = "too long"))]
        name: Option<String>,
        #[validate(email)]
        email: Option<String>,
    }

    #[test]
    fn test_add_accumulates_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("title", "first");
        errors.add("title", "second");
        errors.add("author", "missing");

        assert_eq!(errors.get("title").unwrap(), ["first", "second"]);
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["author", "title"]);
    }

    #[test]
    fn test_publication_year_boundary() {
        let ctx = ValidationContext { current_year: 2026 };

        let mut errors = FieldErrors::new();
        check_publication_year(&mut errors, 2026, &ctx);
        assert!(errors.is_empty());

        check_publication_year(&mut errors, 2027, &ctx);
        let messages = errors.get("publication_year").unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("2027"));
        assert!(messages[0].contains("2026"));
    }

    #[test]
    fn test_blank_detection() {
        let mut errors = FieldErrors::new();
        check_not_blank(&mut errors, "title", "   ");
        check_not_blank(&mut errors, "name", "Ok");

        assert_eq!(errors.get("title").unwrap(), [BLANK]);
        assert!(!errors.contains("name"));
    }

    #[test]
    fn test_merge_validator_collects_every_field() {
        let sample = Sample {
            name: Some("abcdef".to_string()),
            email: Some("not-an-email".to_string()),
        };

        let mut errors = FieldErrors::new();
        errors.merge_validator(&sample.validate().unwrap_err());

        assert_eq!(errors.get("name").unwrap(), ["too long"]);
        assert!(errors.contains("email"));
    }

    #[test]
    fn test_absorb_first_keeps_earlier_failures() {
        let mut errors = FieldErrors::new();
        errors.add("title", REQUIRED);

        let mut later = FieldErrors::new();
        later.add("title", "too long");
        later.add("name", "too long");
        later.add("name", "bad characters");
        errors.absorb_first(later);

        assert_eq!(errors.get("title").unwrap(), [REQUIRED]);
        assert_eq!(errors.get("name").unwrap(), ["too long"]);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut errors = FieldErrors::new();
        errors.add("title", REQUIRED);

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value, serde_json::json!({ "title": [REQUIRED] }));
    }

    #[test]
    fn test_decode_payload_accepts_partial_objects() {
        let payload: Payload = decode_payload(br#"{"title":"Dune","extra":true}"#).unwrap();
        assert_eq!(payload.title.as_deref(), Some("Dune"));
        assert!(payload.year.is_none());

        let empty: Payload = decode_payload(b"  ").unwrap();
        assert!(empty.title.is_none());
    }

    #[test]
    fn test_decode_payload_reports_type_errors_per_field() {
        let err = decode_payload::<Payload>(br#"{"title":5,"year":"soon"}"#).unwrap_err();

        let fields = err.field_errors().unwrap();
        assert_eq!(fields.get("title").unwrap(), [INVALID_STRING]);
        assert_eq!(fields.get("year").unwrap(), [INVALID_INTEGER]);
    }

    #[test]
    fn test_decode_payload_rejects_malformed_and_non_object_bodies() {
        let err = decode_payload::<Payload>(b"{not json").unwrap_err();
        let message = &err.field_errors().unwrap().get(FieldErrors::NON_FIELD).unwrap()[0];
        assert!(message.starts_with("JSON parse error - "));

        let err = decode_payload::<Payload>(b"[1, 2]").unwrap_err();
        assert_eq!(
            err.field_errors().unwrap().get(FieldErrors::NON_FIELD).unwrap(),
            ["Invalid data. Expected a dictionary, but got array."]
        );
    }
}
