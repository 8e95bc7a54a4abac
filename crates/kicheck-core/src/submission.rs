//! Questionnaire submissions as received from the KI-Check web form.
//!
//! A submission is an untyped JSON object: field names differ between form
//! variants, so values are read by name through [`Submission::text`] and
//! friends rather than deserialized into a fixed struct.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("submission must be a JSON object")]
    NotAnObject,
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// One questionnaire response. Lives for a single request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Submission {
    fields: Map<String, Value>,
}

impl Submission {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a submission from a decoded request body.
    pub fn from_value(value: Value) -> Result<Self, SubmissionError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(SubmissionError::NotAnObject),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Read a field as display text.
    ///
    /// Strings are trimmed, arrays of scalars are joined with `", "`, numbers
    /// and booleans are rendered as-is. Absent, `null` and blank values are `None`.
    pub fn text(&self, field: &str) -> Option<String> {
        let rendered = match self.fields.get(field)? {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            Value::Array(items) => items
                .iter()
                .filter_map(scalar_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            other => scalar_text(other)?,
        };
        (!rendered.is_empty()).then_some(rendered)
    }

    /// [`text`](Self::text) with a declared fallback for missing values.
    pub fn text_or(&self, field: &str, default: &str) -> String {
        self.text(field).unwrap_or_else(|| default.to_string())
    }

    /// Check that every field in `required` carries a non-blank value.
    ///
    /// All missing fields are reported at once, in the order given.
    pub fn require<S: AsRef<str>>(&self, required: &[S]) -> Result<(), SubmissionError> {
        let missing: Vec<String> = required
            .iter()
            .map(|f| f.as_ref())
            .filter(|f| self.text(f).is_none())
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SubmissionError::MissingFields(missing))
        }
    }

    /// The optional `template_variant` selector (`"preview"` or anything else).
    pub fn template_variant(&self) -> Option<&str> {
        self.fields.get("template_variant").and_then(Value::as_str)
    }

    /// Whether the caller asked for both a preview and a full document.
    pub fn wants_preview(&self) -> bool {
        match self.fields.get("preview") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// A score computed client-side, as sent by older form versions.
    pub fn score_hint(&self) -> Option<i64> {
        match self.fields.get("score")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for Submission {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Submission {
        Submission::from_value(json!({
            "name": "  Erika Muster ",
            "unternehmen": "Muster GmbH",
            "branche": "",
            "tools": null,
            "modul_1_antworten": ["ja", "nein", 3],
            "mitarbeitende": 42,
            "preview": true,
            "template_variant": "preview",
            "score": "27"
        }))
        .unwrap()
    }

    #[test]
    fn rejects_non_object_bodies() {
        assert_eq!(
            Submission::from_value(json!(["a", "b"])),
            Err(SubmissionError::NotAnObject)
        );
    }

    #[test]
    fn text_trims_and_renders_scalars() {
        let s = sample();
        assert_eq!(s.text("name").as_deref(), Some("Erika Muster"));
        assert_eq!(s.text("mitarbeitende").as_deref(), Some("42"));
        assert_eq!(s.text("modul_1_antworten").as_deref(), Some("ja, nein, 3"));
    }

    #[test]
    fn blank_null_and_absent_fall_back_to_default() {
        let s = sample();
        assert_eq!(s.text_or("branche", "Allgemein"), "Allgemein");
        assert_eq!(s.text_or("tools", "keine"), "keine");
        assert_eq!(s.text_or("ziel", "nicht angegeben"), "nicht angegeben");
    }

    #[test]
    fn require_lists_every_missing_field_in_order() {
        let err = sample()
            .require(&["name", "branche", "unternehmen", "email"])
            .unwrap_err();
        assert_eq!(
            err,
            SubmissionError::MissingFields(vec!["branche".into(), "email".into()])
        );
        assert_eq!(err.to_string(), "missing required fields: branche, email");
    }

    #[test]
    fn flags_and_hints() {
        let s = sample();
        assert!(s.wants_preview());
        assert_eq!(s.template_variant(), Some("preview"));
        assert_eq!(s.score_hint(), Some(27));
        assert!(!Submission::default().wants_preview());
    }
}
