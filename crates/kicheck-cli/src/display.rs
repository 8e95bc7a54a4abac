//! Vertical card display for scored submissions.
//!
//! Renders the declared prompt fields, each scoring category with its
//! per-question values, and the overall result.

use std::fmt::Write;

use kicheck_core::{FormVariant, ScoreResult, Submission, ordinal_value};

const LABEL_WIDTH: usize = 22;

// ── Public API ──

/// Print a submission as a card grouped into sections.
pub fn print_score_card(submission: &Submission, form: &FormVariant, score: Option<&ScoreResult>) {
    print!("{}", render_score_card(submission, form, score));
}

pub fn render_score_card(
    submission: &Submission,
    form: &FormVariant,
    score: Option<&ScoreResult>,
) -> String {
    let mut out = String::new();
    let name = submission.text_or("name", "unbekannt");
    let _ = writeln!(out, "=== {name} ===");
    if let Some(company) = submission.text("unternehmen") {
        let _ = writeln!(out, "{company}");
    }
    let _ = writeln!(out);

    render_fields(&mut out, submission, form);
    if let Some(score) = score {
        render_categories(&mut out, submission, form, score);
        render_result(&mut out, score);
    }
    out
}

// ── Section rendering ──

fn render_fields(out: &mut String, submission: &Submission, form: &FormVariant) {
    // Skip the section entirely if nothing was answered.
    if !form.prompt_fields.iter().any(|f| submission.text(&f.key).is_some()) {
        return;
    }
    let _ = writeln!(out, "Angaben");
    for field in &form.prompt_fields {
        if let Some(value) = submission.text(&field.key) {
            let _ = writeln!(out, "  {:<LABEL_WIDTH$} {}", field.label, value);
        }
    }
    let _ = writeln!(out);
}

fn render_categories(
    out: &mut String,
    submission: &Submission,
    form: &FormVariant,
    score: &ScoreResult,
) {
    for category in &form.categories {
        let subtotal = score.subtotal(&category.name).unwrap_or(0);
        let max = category.fields.len() * 4;
        let _ = writeln!(out, "{} ({subtotal}/{max})", category.label);
        for key in &category.fields {
            match submission.text(key) {
                Some(answer) => {
                    let _ = writeln!(
                        out,
                        "  {:<LABEL_WIDTH$} {} [{}]",
                        key,
                        answer,
                        ordinal_value(&answer)
                    );
                }
                None => {
                    let _ = writeln!(out, "  {:<LABEL_WIDTH$} - [0]", key);
                }
            }
        }
        let _ = writeln!(out);
    }
}

fn render_result(out: &mut String, score: &ScoreResult) {
    let _ = writeln!(out, "Ergebnis");
    let _ = writeln!(out, "  {:<LABEL_WIDTH$} {}", "Gesamtscore", score.total);
    let _ = writeln!(out, "  {:<LABEL_WIDTH$} {}", "Stufe", score.tier);
}
