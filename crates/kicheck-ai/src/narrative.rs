//! Narrative results returned by the completion collaborator.
//!
//! The model is asked for JSON but may answer in prose, or the call may fail
//! altogether. [`Narrative`] keeps the three outcomes apart so the caller can
//! tell "requested shape" from "prose" from "no answer".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::completion::{CompletionClient, CompletionError, CompletionRequest};
use crate::prompt::{AnalysisContext, SYSTEM_PROMPT};

/// Prefix of the placeholder text used when the model could not be reached.
pub const FAILURE_PREFIX: &str = "GPT-Analyse fehlgeschlagen";

/// Payload key for narrative text that is not a JSON object.
pub const TEXT_FIELD: &str = "gpt_auswertung";

#[derive(Debug, Clone, PartialEq)]
pub enum Narrative {
    /// The reply carried the requested JSON shape. `raw` is the reply as sent.
    Structured { value: Value, raw: String },
    /// The reply was prose.
    RawText(String),
    /// The call failed; holds a human-readable placeholder.
    Failed(String),
}

impl Narrative {
    pub fn from_completion(result: Result<String, CompletionError>) -> Self {
        match result {
            Ok(text) => match extract_json(&text) {
                Some(value) => Self::Structured { value, raw: text },
                None => Self::RawText(text),
            },
            Err(e) => Self::failed(e),
        }
    }

    /// Classify a reply to a free-text prompt. JSON in the text is left alone.
    pub fn from_prose(result: Result<String, CompletionError>) -> Self {
        match result {
            Ok(text) => Self::RawText(text),
            Err(e) => Self::failed(e),
        }
    }

    /// Placeholder narrative for a call that failed or never happened.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self::Failed(format!("{FAILURE_PREFIX}: {reason}"))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Structured { .. } => "structured",
            Self::RawText(_) => "raw_text",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Fields merged into the outgoing document payload.
    ///
    /// Non-empty JSON objects are flattened. Everything else puts the reply
    /// text under [`TEXT_FIELD`], so the narrative is never lost.
    pub fn into_fields(self) -> Map<String, Value> {
        match self {
            Self::Structured {
                value: Value::Object(map),
                ..
            } if !map.is_empty() => map,
            Self::Structured { raw: text, .. } | Self::RawText(text) | Self::Failed(text) => {
                single(TEXT_FIELD, Value::String(text))
            }
        }
    }
}

fn single(key: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    map
}

/// Send one prompt and classify the reply. Never fails.
pub async fn generate(client: &dyn CompletionClient, request: &CompletionRequest) -> Narrative {
    Narrative::from_completion(complete_logged(client, request).await)
}

/// Send one free-text prompt. Never fails; the reply is always kept as prose.
pub async fn generate_text(client: &dyn CompletionClient, request: &CompletionRequest) -> Narrative {
    Narrative::from_prose(complete_logged(client, request).await)
}

async fn complete_logged(
    client: &dyn CompletionClient,
    request: &CompletionRequest,
) -> Result<String, CompletionError> {
    let result = client.complete(request).await;
    if let Err(e) = &result {
        warn!(error = %e, "completion failed, using placeholder narrative");
    }
    result
}

/// Most characters of surrounding prose a fenced or embedded JSON value may
/// carry and still count as the reply.
const MAX_WRAPPER_CHARS: usize = 80;

/// Find the requested JSON shape in a model reply.
///
/// Tries the whole text, then a fenced code block, then the outermost
/// `{...}` or `[...]` span. The last two only count when the text around the
/// JSON is a short preamble or trailer.
pub fn extract_json(text: &str) -> Option<Value> {
    let t = text.trim().trim_matches('\u{feff}');

    if let Ok(v) = serde_json::from_str::<Value>(t) {
        return requested_shape(v);
    }

    for fence in ["```json", "```"] {
        if let Some(start) = t.find(fence) {
            let body = start + fence.len();
            if let Some(len) = t[body..].find("```") {
                let end = body + len + "```".len();
                if wrapper_chars(t, start, end) <= MAX_WRAPPER_CHARS {
                    if let Ok(v) = serde_json::from_str::<Value>(t[body..body + len].trim()) {
                        return requested_shape(v);
                    }
                }
            }
        }
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(i), Some(j)) = (t.find(open), t.rfind(close)) {
            if i < j && wrapper_chars(t, i, j + 1) <= MAX_WRAPPER_CHARS {
                if let Ok(v) = serde_json::from_str::<Value>(&t[i..=j]) {
                    return requested_shape(v);
                }
            }
        }
    }

    None
}

fn wrapper_chars(text: &str, start: usize, end: usize) -> usize {
    text[..start].trim().chars().count() + text[end..].trim().chars().count()
}

// Only a non-empty object or a non-empty list of objects is the requested
// shape; citations like `[1]` and placeholders like `{}` are prose.
fn requested_shape(v: Value) -> Option<Value> {
    let accepted = match &v {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_object),
        _ => false,
    };
    accepted.then_some(v)
}

// ── Four-section analysis ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub titel: String,
    #[serde(default)]
    pub beschreibung: String,
    #[serde(default)]
    pub next_step: String,
    #[serde(default)]
    pub tool: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    #[serde(default)]
    pub risikoklasse: String,
    #[serde(default)]
    pub begruendung: String,
    #[serde(default)]
    pub pflichten: Vec<String>,
}

/// Executive summary, analysis, recommendations and risk profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeBundle {
    pub executive_summary: String,
    pub analyse: String,
    pub empfehlungen: Vec<Recommendation>,
    pub risikoprofil: RiskProfile,
}

fn text_of(narrative: Narrative) -> String {
    match narrative {
        Narrative::Structured { raw, .. } | Narrative::RawText(raw) | Narrative::Failed(raw) => raw,
    }
}

fn typed_or_default<T>(narrative: Narrative, section: &str) -> T
where
    T: Default + serde::de::DeserializeOwned,
{
    match narrative {
        Narrative::Structured { value, .. } => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(section, error = %e, "unexpected JSON shape, using empty section");
            T::default()
        }),
        other => {
            warn!(section, kind = other.kind(), "no JSON in reply, using empty section");
            T::default()
        }
    }
}

/// Run the four section prompts one after another.
pub async fn generate_bundle(
    client: &dyn CompletionClient,
    context: &AnalysisContext,
    max_tokens: u32,
    temperature: f32,
) -> NarrativeBundle {
    let request =
        |prompt: String| CompletionRequest::new(SYSTEM_PROMPT, prompt).with_limits(max_tokens, temperature);

    let executive = generate(client, &request(context.executive_prompt())).await;
    let analyse = generate(client, &request(context.analyse_prompt())).await;
    let recommendations = generate(client, &request(context.recommendations_prompt())).await;
    let risk = generate(client, &request(context.risk_profile_prompt())).await;

    NarrativeBundle {
        executive_summary: text_of(executive),
        analyse: text_of(analyse),
        empfehlungen: typed_or_default(recommendations, "empfehlungen"),
        risikoprofil: typed_or_default(risk, "risikoprofil"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order; `None` simulates a provider failure.
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Option<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(replies: &[Option<&str>]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| r.map(str::to_string)).collect()),
                prompts: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(request.user_prompt.clone());
            match self.replies.lock().unwrap().pop_front().flatten() {
                Some(text) => Ok(text),
                None => Err(CompletionError::Provider {
                    status: 503,
                    body: "overloaded".into(),
                }),
            }
        }
    }

    #[test]
    fn prose_is_raw_text() {
        let n = Narrative::from_completion(Ok("Das Unternehmen ist gut aufgestellt.".into()));
        assert_eq!(n.kind(), "raw_text");
    }

    #[test]
    fn bare_json_object_is_structured() {
        let n = Narrative::from_completion(Ok(r#"{"analyse": "ok"}"#.into()));
        assert_eq!(
            n,
            Narrative::Structured {
                value: json!({"analyse": "ok"}),
                raw: r#"{"analyse": "ok"}"#.into(),
            }
        );
    }

    #[test]
    fn citations_and_placeholders_stay_prose() {
        let cited = "Bewertung: solide Basis. Siehe Quellen [1] fuer weitere Details.";
        let n = Narrative::from_completion(Ok(cited.into()));
        assert_eq!(n.kind(), "raw_text");
        assert_eq!(n.into_fields()[TEXT_FIELD], cited);

        let braces = "Empfehlung: Vorlage {} verwenden und das Team schulen.";
        let n = Narrative::from_completion(Ok(braces.into()));
        assert_eq!(n.kind(), "raw_text");
        assert_eq!(n.into_fields()[TEXT_FIELD], braces);
    }

    #[test]
    fn json_inside_long_prose_is_not_the_reply() {
        let text = "Die Auswertung zeigt eine solide Ausgangslage mit klaren Zielen. \
                    Als Beispiel fuer ein Datenformat: {\"feld\": \"wert\"}. \
                    Im naechsten Schritt sollte ein Pilotprojekt gestartet werden.";
        assert_eq!(extract_json(text), None);
    }

    #[test]
    fn scalar_lists_and_empty_containers_are_not_structured() {
        assert_eq!(extract_json("[1, 2]"), None);
        assert_eq!(extract_json("{}"), None);
        assert_eq!(extract_json("[]"), None);
    }

    #[test]
    fn fenced_and_embedded_json_are_found() {
        let fenced = "Hier ist das Ergebnis:\n```json\n[{\"titel\": \"A\"}]\n```";
        assert_eq!(extract_json(fenced), Some(json!([{"titel": "A"}])));

        let embedded = "Ergebnis: {\"risikoklasse\": \"hoch\"} Ende.";
        assert_eq!(extract_json(embedded), Some(json!({"risikoklasse": "hoch"})));
    }

    #[test]
    fn json_scalars_are_not_structured() {
        assert_eq!(extract_json("42"), None);
        assert_eq!(extract_json("\"nur text\""), None);
    }

    #[test]
    fn failure_becomes_placeholder_text() {
        let n = Narrative::from_completion(Err(CompletionError::Empty));
        assert!(n.is_failed());
        let fields = n.into_fields();
        let text = fields[TEXT_FIELD].as_str().unwrap();
        assert!(text.starts_with("GPT-Analyse fehlgeschlagen: "));
    }

    #[test]
    fn structured_object_flattens_into_fields() {
        let fields = Narrative::Structured {
            value: json!({"executive_summary": "kurz", "analyse": "lang"}),
            raw: String::new(),
        }
        .into_fields();
        assert_eq!(fields["executive_summary"], "kurz");
        assert!(!fields.contains_key(TEXT_FIELD));

        let list = Narrative::Structured {
            value: json!([{"titel": "A"}]),
            raw: "[{\"titel\": \"A\"}]".into(),
        }
        .into_fields();
        assert_eq!(list[TEXT_FIELD], "[{\"titel\": \"A\"}]");

        let empty = Narrative::Structured {
            value: json!({}),
            raw: "Vorlage {}".into(),
        }
        .into_fields();
        assert_eq!(empty[TEXT_FIELD], "Vorlage {}");
    }

    #[tokio::test]
    async fn generate_never_propagates_errors() {
        let client = ScriptedClient::new(&[None]);
        let n = generate(&client, &CompletionRequest::new("sys", "hallo")).await;
        assert_eq!(n.kind(), "failed");
    }

    #[tokio::test]
    async fn generate_text_keeps_json_looking_replies_as_prose() {
        let client = ScriptedClient::new(&[Some(r#"{"analyse": "x"}"#), None]);
        let request = CompletionRequest::new("sys", "bewerte");
        let n = generate_text(&client, &request).await;
        assert_eq!(n, Narrative::RawText(r#"{"analyse": "x"}"#.into()));
        assert!(generate_text(&client, &request).await.is_failed());
    }

    #[tokio::test]
    async fn bundle_parses_sections_in_order() {
        let client = ScriptedClient::new(&[
            Some("Kurzfassung"),
            Some("Strategie"),
            Some(r#"[{"titel": "Pilot", "beschreibung": "klein starten", "next_step": "Team", "tool": "ChatGPT"}]"#),
            Some(r#"{"risikoklasse": "begrenzt", "begruendung": "wenig Daten", "pflichten": ["a", "b", "c"]}"#),
        ]);
        let ctx = AnalysisContext {
            branche: "Handel".into(),
            ziel: "Effizienz".into(),
            tools: "keine".into(),
            herausforderung: "keine".into(),
            score: 17,
        };
        let bundle = generate_bundle(&client, &ctx, 800, 0.7).await;
        assert_eq!(bundle.executive_summary, "Kurzfassung");
        assert_eq!(bundle.analyse, "Strategie");
        assert_eq!(bundle.empfehlungen.len(), 1);
        assert_eq!(bundle.empfehlungen[0].tool, "ChatGPT");
        assert_eq!(bundle.risikoprofil.pflichten.len(), 3);

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 4);
        assert!(prompts[0].contains("Executive Summary"));
        assert!(prompts[3].contains("Risikoprofil"));
    }

    #[tokio::test]
    async fn bundle_falls_back_to_empty_sections() {
        let client = ScriptedClient::new(&[None, Some("Strategie"), Some("keine Ahnung"), None]);
        let ctx = AnalysisContext::from_submission(&Default::default(), None);
        let bundle = generate_bundle(&client, &ctx, 800, 0.7).await;
        assert!(bundle.executive_summary.starts_with(FAILURE_PREFIX));
        assert!(bundle.empfehlungen.is_empty());
        assert_eq!(bundle.risikoprofil, RiskProfile::default());
    }
}
