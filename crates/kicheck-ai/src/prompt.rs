//! Prompt templates for the KI-Check narratives.

use kicheck_core::{FormVariant, ScoreResult, Submission};

// ── System prompts ──

pub const SYSTEM_PROMPT: &str = "\
Du bist ein zertifizierter KI-Berater. Antworte strukturiert und geschäftlich, \
aber klar verständlich.";

pub const PDF_SYSTEM_PROMPT: &str = "Du bist KI-Experte für Unternehmen.";

const JSON_SHAPE: &str = "\
Antworte AUSSCHLIESSLICH mit einem JSON-Objekt. Kein Markdown, keine Erklärung, nur rohes JSON:
{
  \"executive_summary\": \"kurze Zusammenfassung\",
  \"analyse\": \"strategische Einordnung\",
  \"empfehlungen\": [
    {\"titel\": \"...\", \"beschreibung\": \"...\", \"next_step\": \"...\", \"tool\": \"...\"}
  ],
  \"risikoprofil\": {
    \"risikoklasse\": \"...\",
    \"begruendung\": \"...\",
    \"pflichten\": [\"...\", \"...\", \"...\"]
  }
}";

/// Maximum score of the four-section analysis.
pub const SCORE_SCALE: u32 = 40;

fn field_lines(submission: &Submission, form: &FormVariant) -> String {
    form.prompt_fields
        .iter()
        .map(|f| format!("{}: {}", f.label, submission.text_or(&f.key, &f.default)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn score_lines(form: &FormVariant, score: &ScoreResult) -> String {
    let mut lines: Vec<String> = score
        .subtotals
        .iter()
        .map(|(name, value)| {
            let label = form
                .categories
                .iter()
                .find(|c| &c.name == name)
                .map(|c| c.label.as_str())
                .unwrap_or(name);
            format!("{label}: {value}")
        })
        .collect();
    lines.push(format!("Gesamtscore: {} ({})", score.total, score.tier));
    lines.join("\n")
}

/// Prompt for `/analyze`: all declared fields, the score block, and the JSON shape.
pub fn analysis_prompt(
    submission: &Submission,
    form: &FormVariant,
    score: Option<&ScoreResult>,
) -> String {
    let mut prompt = format!(
        "Analysiere die Antworten eines KI-Checks.\n{}\n",
        field_lines(submission, form)
    );
    if let Some(score) = score {
        prompt.push_str(&format!("\nBewertung:\n{}\n", score_lines(form, score)));
    }
    prompt.push('\n');
    prompt.push_str(JSON_SHAPE);
    prompt
}

/// Free-text evaluation prompt used for the PDF report.
pub fn pdf_prompt(submission: &Submission, form: &FormVariant, score: Option<&ScoreResult>) -> String {
    let mut prompt = format!(
        "Analysiere die Antworten eines KI-Checks.\n{}\n",
        field_lines(submission, form)
    );
    if let Some(score) = score {
        prompt.push_str(&format!("{}\n", score_lines(form, score)));
    }
    prompt.push_str(
        "\nBitte gib eine Bewertung, Tipps, Risiken und Empfehlungen für den KI-Einsatz zurück.",
    );
    prompt
}

/// Inputs of the four-section analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisContext {
    pub branche: String,
    pub ziel: String,
    pub tools: String,
    pub herausforderung: String,
    pub score: i64,
}

impl AnalysisContext {
    pub fn from_submission(submission: &Submission, score: Option<&ScoreResult>) -> Self {
        Self {
            branche: submission.text_or("branche", "Allgemein"),
            ziel: submission.text_or("ziel", "nicht angegeben"),
            tools: submission.text_or("tools", "keine"),
            herausforderung: submission.text_or("herausforderung", "keine"),
            score: score
                .map(|s| i64::from(s.total))
                .or_else(|| submission.score_hint())
                .unwrap_or(0),
        }
    }

    pub fn executive_prompt(&self) -> String {
        format!(
            "Erstelle eine kurze Executive Summary für ein Unternehmen der Branche {} \
             mit folgendem Ziel: {}. Der aktuelle Score im KI-Check beträgt {}/{SCORE_SCALE}.",
            self.branche, self.ziel, self.score
        )
    }

    pub fn analyse_prompt(&self) -> String {
        format!(
            "Analysiere strategisch, wie ein Unternehmen in der Branche {} mit einem Score von {} \
             beim KI-Einsatz aufgestellt ist. Berücksichtige: Tools = {}, Herausforderung = {}.",
            self.branche, self.score, self.tools, self.herausforderung
        )
    }

    pub fn recommendations_prompt(&self) -> String {
        format!(
            "Gib drei konkrete Empfehlungen (je mit Titel, Beschreibung, next_step, tool) für den \
             KI-Einsatz in einem Unternehmen der Branche {} mit Score {} und Ziel: {}.\n\
             Antworte im JSON-Format: \
             [{{\"titel\": ..., \"beschreibung\": ..., \"next_step\": ..., \"tool\": ...}}, ...]",
            self.branche, self.score, self.ziel
        )
    }

    pub fn risk_profile_prompt(&self) -> String {
        format!(
            "Leite ein Risikoprofil für das Unternehmen mit Score {} ab. Gib Risikoklasse, \
             Begründung und 3 empfohlene Pflichten aus.\n\
             Antworte im JSON-Format: \
             {{\"risikoklasse\": ..., \"begruendung\": ..., \"pflichten\": [\"...\", \"...\", \"...\"]}}",
            self.score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kicheck_core::score;
    use serde_json::json;

    fn submission() -> Submission {
        Submission::from_value(json!({
            "name": "Erika Muster",
            "unternehmen": "Muster GmbH",
            "branche": "Handel",
            "tools": ["ChatGPT", "DeepL"],
            "r1": "voll zutreffend",
            "c1": "teilweise"
        }))
        .unwrap()
    }

    #[test]
    fn analysis_prompt_interpolates_fields_and_defaults() {
        let form = FormVariant::ki_check();
        let prompt = analysis_prompt(&submission(), &form, None);
        assert!(prompt.contains("Unternehmen: Muster GmbH"));
        assert!(prompt.contains("Tools: ChatGPT, DeepL"));
        assert!(prompt.contains("Ziel: nicht angegeben"));
        assert!(prompt.contains("Herausforderung: keine"));
        assert!(prompt.contains("\"risikoprofil\""));
        assert!(!prompt.contains("Gesamtscore"));
    }

    #[test]
    fn analysis_prompt_includes_score_block() {
        let form = FormVariant::ki_check();
        let s = submission();
        let result = score(&s, &form.categories);
        let prompt = analysis_prompt(&s, &form, Some(&result));
        assert!(prompt.contains("KI-Readiness: 4"));
        assert!(prompt.contains("Compliance: 2"));
        assert!(prompt.contains("Gesamtscore: 6 (kritisch)"));
    }

    #[test]
    fn prompts_are_deterministic() {
        let form = FormVariant::basic();
        assert_eq!(
            pdf_prompt(&submission(), &form, None),
            pdf_prompt(&submission(), &form, None)
        );
    }

    #[test]
    fn pdf_prompt_asks_for_free_text() {
        let prompt = pdf_prompt(&submission(), &FormVariant::basic(), None);
        assert!(prompt.contains("Modul 1: keine"));
        assert!(prompt.ends_with("Empfehlungen für den KI-Einsatz zurück."));
    }

    #[test]
    fn context_defaults_and_score_hint() {
        let s = Submission::from_value(json!({"score": 23})).unwrap();
        let ctx = AnalysisContext::from_submission(&s, None);
        assert_eq!(ctx.branche, "Allgemein");
        assert_eq!(ctx.ziel, "nicht angegeben");
        assert_eq!(ctx.tools, "keine");
        assert_eq!(ctx.score, 23);
        assert!(ctx.executive_prompt().contains("23/40"));
        assert!(ctx.recommendations_prompt().contains("\"next_step\""));
        assert!(ctx.risk_profile_prompt().contains("\"pflichten\""));
    }
}
