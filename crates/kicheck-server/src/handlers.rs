use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use kicheck_core::Submission;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::pipeline::{self, DocumentOutcome, SectionedAnalysis};
use crate::{ApiError, ApiResult, AppState};

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub form: String,
    pub completion: bool,
    pub rendering: bool,
    pub webhook: bool,
}

fn submission(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Submission> {
    let Json(value) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(Submission::from_value(value)?)
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Service läuft" }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        form: state.form.name.clone(),
        completion: state.completion.is_some(),
        rendering: state.renderer.is_some(),
        webhook: state.webhook.is_some(),
    })
}

pub async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Map<String, Value>>> {
    let submission = submission(body)?;
    Ok(Json(pipeline::analyze(&state, &submission).await?))
}

pub async fn gpt_analyze(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<SectionedAnalysis>> {
    let submission = submission(body)?;
    Ok(Json(pipeline::analyze_sections(&state, &submission).await?))
}

pub async fn generate_pdf(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<DocumentOutcome>> {
    let submission = submission(body)?;
    Ok(Json(pipeline::generate_documents(&state, &submission).await?))
}
