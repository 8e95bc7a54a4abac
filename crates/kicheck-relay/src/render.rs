//! PDFMonkey document rendering.

use async_trait::async_trait;
use kicheck_core::Settings;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::RenderError;

/// Merged record plus the template it is rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
    pub template_id: String,
    pub payload: Map<String, Value>,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render one document and return its retrieval URL.
    async fn render(&self, request: &DocumentRequest) -> Result<String, RenderError>;
}

#[derive(Serialize)]
struct CreateDocument<'a> {
    document: DocumentBody<'a>,
}

#[derive(Serialize)]
struct DocumentBody<'a> {
    document_template_id: &'a str,
    payload: &'a Map<String, Value>,
    status: &'static str,
}

#[derive(Deserialize)]
struct CreateResponse {
    data: DocumentData,
}

#[derive(Deserialize)]
struct DocumentData {
    #[serde(default)]
    id: Option<String>,
    attributes: DocumentAttributes,
}

#[derive(Deserialize)]
struct DocumentAttributes {
    #[serde(default)]
    download_url: Option<String>,
}

/// Client for the PDFMonkey documents API.
pub struct PdfMonkeyClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PdfMonkeyClient {
    /// `base_url` should be like `https://api.pdfmonkey.io/api/v1` (no trailing slash).
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build a client from settings, if an API key is configured.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let key = settings.require_pdfmonkey_key().ok()?;
        Some(Self::new(settings.pdfmonkey_base_url.clone(), key.to_string()))
    }
}

#[async_trait]
impl DocumentRenderer for PdfMonkeyClient {
    async fn render(&self, request: &DocumentRequest) -> Result<String, RenderError> {
        let url = format!("{}/documents", self.base_url);
        let body = CreateDocument {
            document: DocumentBody {
                document_template_id: &request.template_id,
                payload: &request.payload,
                status: "pending",
            },
        };

        info!(template = %request.template_id, fields = request.payload.len(), "creating document");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RenderError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreateResponse = resp.json().await?;
        let download_url = created
            .data
            .attributes
            .download_url
            .ok_or(RenderError::MissingUrl)?;
        info!(document = ?created.data.id, "document created");
        Ok(download_url)
    }
}
