//! The request pipeline: intake, scoring, narrative, document assembly, relay.
//!
//! Outbound calls are strictly sequential. Narrative failures are soft and
//! degrade to placeholder text; configuration and rendering failures are hard.

use kicheck_ai::prompt::{PDF_SYSTEM_PROMPT, analysis_prompt, pdf_prompt};
use kicheck_ai::{
    AnalysisContext, CompletionRequest, Narrative, NarrativeBundle, SYSTEM_PROMPT,
    generate, generate_bundle, generate_text,
};
use kicheck_core::{ScoreResult, Submission, TemplateVariant, score};
use kicheck_relay::DocumentRequest;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::{ApiResult, AppState};

/// Score the submission if the active form declares categories.
pub fn score_submission(state: &AppState, submission: &Submission) -> Option<ScoreResult> {
    state
        .form
        .is_scored()
        .then(|| score(submission, &state.form.categories))
}

/// `scores`, `score_total` and `tier` payload fields.
pub fn score_fields(result: &ScoreResult) -> Map<String, Value> {
    let scores: Map<String, Value> = result
        .subtotals
        .iter()
        .map(|(name, value)| (name.clone(), json!(value)))
        .collect();
    let mut fields = Map::new();
    fields.insert("scores".into(), Value::Object(scores));
    fields.insert("score_total".into(), json!(result.total));
    fields.insert("tier".into(), json!(result.tier));
    fields
}

/// Merge submission, scores and narrative into one record.
///
/// Computed fields never overwrite what the caller sent, so the record is
/// always a superset of the submission.
pub fn assemble(
    submission: &Submission,
    score: Option<&ScoreResult>,
    narrative: Narrative,
) -> Map<String, Value> {
    let mut record = submission.fields().clone();
    if let Some(score) = score {
        add_missing(&mut record, score_fields(score));
    }
    add_missing(&mut record, narrative.into_fields());
    record
}

fn add_missing(record: &mut Map<String, Value>, fields: Map<String, Value>) {
    for (key, value) in fields {
        record.entry(key).or_insert(value);
    }
}

fn insert_missing(record: &mut Map<String, Value>, key: &str, value: Value) {
    record.entry(key).or_insert(value);
}

fn completion_request(state: &AppState, system: &str, prompt: String) -> CompletionRequest {
    CompletionRequest::new(system, prompt)
        .with_limits(state.settings.max_tokens, state.settings.temperature)
}

/// `/analyze`: scores plus the structured narrative.
pub async fn analyze(state: &AppState, submission: &Submission) -> ApiResult<Map<String, Value>> {
    submission.require(&state.form.required)?;
    let client = state.completion()?;

    let score = score_submission(state, submission);
    let prompt = analysis_prompt(submission, &state.form, score.as_ref());
    let narrative = generate(client, &completion_request(state, SYSTEM_PROMPT, prompt)).await;
    let kind = narrative.kind();
    info!(form = %state.form.name, narrative = kind, tier = ?score.as_ref().map(|s| s.tier), "analysis complete");

    let mut record = assemble(submission, score.as_ref(), narrative);
    insert_missing(&mut record, "narrative_kind", json!(kind));
    Ok(record)
}

#[derive(Debug, Serialize)]
pub struct SectionedAnalysis {
    #[serde(flatten)]
    pub bundle: NarrativeBundle,
    pub score: i64,
    pub branche: String,
    pub ziel: String,
}

/// `/gpt-analyze`: executive summary, analysis, recommendations, risk profile.
pub async fn analyze_sections(
    state: &AppState,
    submission: &Submission,
) -> ApiResult<SectionedAnalysis> {
    let client = state.completion()?;
    let score = score_submission(state, submission);
    let context = AnalysisContext::from_submission(submission, score.as_ref());
    let bundle = generate_bundle(
        client,
        &context,
        state.settings.max_tokens,
        state.settings.temperature,
    )
    .await;
    Ok(SectionedAnalysis {
        bundle,
        score: context.score,
        branche: context.branche,
        ziel: context.ziel,
    })
}

/// Outcome of `/generate-pdf`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DocumentOutcome {
    Single {
        pdf_url: String,
    },
    /// Preview failure is fatal; a failed full render is reported alongside
    /// the preview URL.
    PreviewAndFull {
        preview: String,
        full: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        full_error: Option<String>,
    },
}

/// `/generate-pdf`: assemble the record, render it, relay it.
pub async fn generate_documents(
    state: &AppState,
    submission: &Submission,
) -> ApiResult<DocumentOutcome> {
    // Configuration first: nothing goes out if a required key is missing.
    let renderer = state.renderer()?;
    let both = submission.wants_preview();
    let variant = TemplateVariant::from_flag(submission.template_variant());
    let preview_template = if both {
        Some(state.settings.template_for(TemplateVariant::Preview)?.to_string())
    } else {
        None
    };
    let primary_variant = if both { TemplateVariant::Full } else { variant };
    let primary_template = state.settings.template_for(primary_variant)?.to_string();

    submission.require(&state.form.required)?;

    let score = score_submission(state, submission);
    let narrative = match state.completion() {
        Ok(client) => {
            let prompt = pdf_prompt(submission, &state.form, score.as_ref());
            generate_text(client, &completion_request(state, PDF_SYSTEM_PROMPT, prompt)).await
        }
        Err(e) => {
            warn!(error = %e, "no completion client, document gets placeholder narrative");
            Narrative::failed(e)
        }
    };

    let mut record = assemble(submission, score.as_ref(), narrative);
    insert_missing(
        &mut record,
        "erstellt_am",
        json!(chrono::Utc::now().date_naive().to_string()),
    );

    let outcome = match preview_template {
        None => {
            insert_missing(&mut record, "template_variant", json!(variant.as_str()));
            let pdf_url = renderer
                .render(&DocumentRequest {
                    template_id: primary_template,
                    payload: record.clone(),
                })
                .await?;
            info!(variant = variant.as_str(), "document rendered");
            DocumentOutcome::Single { pdf_url }
        }
        Some(preview_template) => {
            let mut preview_payload = record.clone();
            insert_missing(&mut preview_payload, "template_variant", json!("preview"));
            let preview = renderer
                .render(&DocumentRequest {
                    template_id: preview_template,
                    payload: preview_payload,
                })
                .await?;

            insert_missing(&mut record, "template_variant", json!("full"));
            match renderer
                .render(&DocumentRequest {
                    template_id: primary_template,
                    payload: record.clone(),
                })
                .await
            {
                Ok(full) => DocumentOutcome::PreviewAndFull {
                    preview,
                    full: Some(full),
                    full_error: None,
                },
                Err(e) => {
                    warn!(error = %e, "full document failed, returning preview only");
                    DocumentOutcome::PreviewAndFull {
                        preview,
                        full: None,
                        full_error: Some(e.details()),
                    }
                }
            }
        }
    };

    relay(state, record, &outcome);
    Ok(outcome)
}

/// Hand the final record to the webhook dispatcher, if one is configured.
///
/// `pdf_url` and `preview_url` are reserved here: the rendered URLs replace
/// anything the caller sent under those keys.
fn relay(state: &AppState, mut record: Map<String, Value>, outcome: &DocumentOutcome) {
    let Some(webhook) = &state.webhook else {
        return;
    };
    match outcome {
        DocumentOutcome::Single { pdf_url } => {
            record.insert("pdf_url".into(), json!(pdf_url));
        }
        DocumentOutcome::PreviewAndFull { preview, full, .. } => {
            record.insert("preview_url".into(), json!(preview));
            record.insert("pdf_url".into(), json!(full));
        }
    }
    // Errors are already logged by the dispatcher.
    let _ = webhook.dispatch(Value::Object(record));
}
