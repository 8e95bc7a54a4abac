//! Declared field schemas for the questionnaire variants.
//!
//! Every deployed form differs only in field names, required fields, scoring
//! categories and the fields echoed into the prompt. A [`FormVariant`] carries
//! all of that, so one pipeline serves every form.

use serde::{Deserialize, Serialize};

/// A group of Likert-scale answers summed into one subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub label: String,
    pub fields: Vec<String>,
}

/// A submission field interpolated into the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptField {
    pub key: String,
    pub label: String,
    #[serde(default = "default_placeholder")]
    pub default: String,
}

fn default_placeholder() -> String {
    "nicht angegeben".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormVariant {
    pub name: String,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub prompt_fields: Vec<PromptField>,
}

impl FormVariant {
    /// Names of the built-in variants, for CLI help and error messages.
    pub const BUILTIN: &'static [&'static str] = &["ki-check", "basic"];

    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "ki-check" => Some(Self::ki_check()),
            "basic" => Some(Self::basic()),
            _ => None,
        }
    }

    /// The scored readiness/compliance check.
    pub fn ki_check() -> Self {
        Self {
            name: "ki-check".into(),
            required: vec!["name".into(), "unternehmen".into(), "branche".into()],
            categories: vec![
                category("readiness", "KI-Readiness", "r"),
                category("compliance", "Compliance", "c"),
            ],
            prompt_fields: vec![
                field("name", "Name", "nicht angegeben"),
                field("unternehmen", "Unternehmen", "nicht angegeben"),
                field("branche", "Branche", "Allgemein"),
                field("unternehmensgroesse", "Unternehmensgröße", "nicht angegeben"),
                field("ziel", "Ziel", "nicht angegeben"),
                field("tools", "Tools", "keine"),
                field("herausforderung", "Herausforderung", "keine"),
                field("massnahmen", "Maßnahmen", "keine"),
            ],
        }
    }

    /// The unscored form used by the plain PDF endpoint.
    pub fn basic() -> Self {
        Self {
            name: "basic".into(),
            required: vec!["name".into(), "unternehmen".into(), "email".into()],
            categories: Vec::new(),
            prompt_fields: vec![
                field("name", "Name", "nicht angegeben"),
                field("unternehmen", "Unternehmen", "nicht angegeben"),
                field("branche", "Branche", "Allgemein"),
                field("selbststaendig", "Selbstständig", "nicht angegeben"),
                field("modul_1_antworten", "Modul 1", "keine"),
                field("modul_2_antworten", "Modul 2", "keine"),
                field("use_case", "Use Case", "nicht angegeben"),
                field("geschaeftsbereich", "Geschäftsbereich", "nicht angegeben"),
                field("tools", "Tools", "keine"),
                field("ziel", "Ziel", "nicht angegeben"),
                field("herausforderung", "Herausforderung", "keine"),
                field("massnahmen", "Maßnahmen", "keine"),
            ],
        }
    }

    /// Load a variant declared as JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_scored(&self) -> bool {
        !self.categories.is_empty()
    }
}

fn category(name: &str, label: &str, prefix: &str) -> Category {
    Category {
        name: name.into(),
        label: label.into(),
        fields: (1..=5).map(|i| format!("{prefix}{i}")).collect(),
    }
}

fn field(key: &str, label: &str, default: &str) -> PromptField {
    PromptField {
        key: key.into(),
        label: label.into(),
        default: default.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve_by_name() {
        for name in FormVariant::BUILTIN {
            let variant = FormVariant::builtin(name).unwrap();
            assert_eq!(&variant.name, name);
        }
        assert!(FormVariant::builtin("unknown").is_none());
    }

    #[test]
    fn ki_check_has_two_five_question_categories() {
        let variant = FormVariant::ki_check();
        assert!(variant.is_scored());
        assert_eq!(variant.categories[0].fields, ["r1", "r2", "r3", "r4", "r5"]);
        assert_eq!(variant.categories[1].fields, ["c1", "c2", "c3", "c4", "c5"]);
        assert_eq!(variant.required, ["name", "unternehmen", "branche"]);
    }

    #[test]
    fn variant_from_json_fills_defaults() {
        let variant = FormVariant::from_json(
            r#"{
                "name": "schnell",
                "required": ["email"],
                "prompt_fields": [{"key": "ziel", "label": "Ziel"}]
            }"#,
        )
        .unwrap();
        assert!(!variant.is_scored());
        assert_eq!(variant.prompt_fields[0].default, "nicht angegeben");
    }
}
