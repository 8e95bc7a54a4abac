//! Likert-scale scoring for questionnaire categories.
//!
//! Each answer is one of four ordinal phrases:
//!
//! | Answer            | Value |
//! |-------------------|-------|
//! | `trifft nicht zu` | 1     |
//! | `teilweise`       | 2     |
//! | `überwiegend`     | 3     |
//! | `voll zutreffend` | 4     |
//!
//! Anything else (including a missing answer) scores 0. Category subtotals
//! are plain sums, and the tier is a fixed banding of the overall total.

use serde::{Deserialize, Serialize};

use crate::form::Category;
use crate::submission::Submission;

const ORDINALS: &[(&str, u32)] = &[
    ("trifft nicht zu", 1),
    ("teilweise", 2),
    ("überwiegend", 3),
    ("voll zutreffend", 4),
];

/// Totals below this are critical.
pub const CRITICAL_BELOW: u32 = 10;
/// Totals below this (and not critical) are still developing.
pub const DEVELOPING_BELOW: u32 = 20;

/// Qualitative band of a total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "kritisch")]
    Kritisch,
    #[serde(rename = "ausbaufähig")]
    Ausbaufaehig,
    #[serde(rename = "gut")]
    Gut,
}

impl Tier {
    pub fn from_total(total: u32) -> Self {
        if total < CRITICAL_BELOW {
            Self::Kritisch
        } else if total < DEVELOPING_BELOW {
            Self::Ausbaufaehig
        } else {
            Self::Gut
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kritisch => "kritisch",
            Self::Ausbaufaehig => "ausbaufähig",
            Self::Gut => "gut",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subtotals per category, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub subtotals: Vec<(String, u32)>,
    pub total: u32,
    pub tier: Tier,
}

impl ScoreResult {
    pub fn subtotal(&self, category: &str) -> Option<u32> {
        self.subtotals
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, v)| *v)
    }
}

/// Map one answer to its ordinal value. Unknown answers are 0.
pub fn ordinal_value(answer: &str) -> u32 {
    let answer = answer.trim().to_lowercase();
    ORDINALS
        .iter()
        .find(|(phrase, _)| *phrase == answer)
        .map(|(_, v)| *v)
        .unwrap_or(0)
}

/// Score a submission against the given categories.
pub fn score(submission: &Submission, categories: &[Category]) -> ScoreResult {
    let subtotals: Vec<(String, u32)> = categories
        .iter()
        .map(|category| {
            let sum = category
                .fields
                .iter()
                .filter_map(|f| submission.text(f))
                .map(|answer| ordinal_value(&answer))
                .sum();
            (category.name.clone(), sum)
        })
        .collect();

    let total = subtotals.iter().map(|(_, v)| v).sum();
    ScoreResult {
        subtotals,
        total,
        tier: Tier::from_total(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormVariant;
    use serde_json::json;

    fn submission(value: serde_json::Value) -> Submission {
        Submission::from_value(value).unwrap()
    }

    #[test]
    fn ordinal_phrases() {
        assert_eq!(ordinal_value("trifft nicht zu"), 1);
        assert_eq!(ordinal_value("teilweise"), 2);
        assert_eq!(ordinal_value("überwiegend"), 3);
        assert_eq!(ordinal_value("voll zutreffend"), 4);
    }

    #[test]
    fn ordinal_ignores_case_and_padding() {
        assert_eq!(ordinal_value("  Überwiegend "), 3);
        assert_eq!(ordinal_value("VOLL ZUTREFFEND"), 4);
    }

    #[test]
    fn unknown_answers_score_zero() {
        assert_eq!(ordinal_value("vielleicht"), 0);
        assert_eq!(ordinal_value(""), 0);
    }

    #[test]
    fn mixed_readiness_and_compliance() {
        let s = submission(json!({
            "r1": "voll zutreffend",
            "r2": "teilweise",
            "r3": "trifft nicht zu",
            "r4": "überwiegend",
            "r5": "teilweise",
            "c2": "teilweise",
            "c3": "teilweise",
            "c5": "trifft nicht zu"
        }));
        let result = score(&s, &FormVariant::ki_check().categories);
        assert_eq!(result.subtotal("readiness"), Some(12));
        assert_eq!(result.subtotal("compliance"), Some(5));
        assert_eq!(result.total, 17);
        assert_eq!(result.tier, Tier::Ausbaufaehig);
    }

    #[test]
    fn missing_and_unrecognised_contribute_nothing() {
        let s = submission(json!({
            "r1": "voll zutreffend",
            "r2": "weiß nicht",
            "r3": 7,
            "c1": null
        }));
        let result = score(&s, &FormVariant::ki_check().categories);
        assert_eq!(result.subtotal("readiness"), Some(4));
        assert_eq!(result.subtotal("compliance"), Some(0));
        assert_eq!(result.total, 4);
        assert_eq!(result.tier, Tier::Kritisch);
    }

    #[test]
    fn total_is_sum_of_subtotals() {
        let mut fields = serde_json::Map::new();
        for i in 1..=5 {
            fields.insert(format!("r{i}"), json!("voll zutreffend"));
            fields.insert(format!("c{i}"), json!("überwiegend"));
        }
        let result = score(&Submission::new(fields), &FormVariant::ki_check().categories);
        let sum: u32 = result.subtotals.iter().map(|(_, v)| v).sum();
        assert_eq!(result.total, sum);
        assert_eq!(result.total, 35);
        assert_eq!(result.tier, Tier::Gut);
    }

    #[test]
    fn tier_band_edges() {
        assert_eq!(Tier::from_total(0), Tier::Kritisch);
        assert_eq!(Tier::from_total(9), Tier::Kritisch);
        assert_eq!(Tier::from_total(10), Tier::Ausbaufaehig);
        assert_eq!(Tier::from_total(19), Tier::Ausbaufaehig);
        assert_eq!(Tier::from_total(20), Tier::Gut);
    }

    #[test]
    fn tier_serializes_as_german_label() {
        assert_eq!(
            serde_json::to_value(Tier::Ausbaufaehig).unwrap(),
            json!("ausbaufähig")
        );
        assert_eq!(Tier::Kritisch.to_string(), "kritisch");
    }

    #[test]
    fn no_categories_yields_empty_zero_score() {
        let result = score(&Submission::default(), &[]);
        assert!(result.subtotals.is_empty());
        assert_eq!(result.total, 0);
    }
}
