//! Runtime settings, built once at startup and shared with every request.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_PDFMONKEY_BASE_URL: &str = "https://api.pdfmonkey.io/api/v1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} fehlt")]
    Missing(&'static str),
}

/// Which rendering template a document is produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateVariant {
    Preview,
    Full,
}

impl TemplateVariant {
    /// `"preview"` selects the preview template; anything else is the full one.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(f) if f.trim().eq_ignore_ascii_case("preview") => Self::Preview,
            _ => Self::Full,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Full => "full",
        }
    }
}

/// Collaborator credentials and tuning.
///
/// Credentials are optional here: a missing key only fails the requests that
/// need it, and does so before any outbound call.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub pdfmonkey_api_key: Option<String>,
    pub pdfmonkey_base_url: String,
    pub template_id: Option<String>,
    pub preview_template_id: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            max_tokens: 800,
            temperature: 0.7,
            pdfmonkey_api_key: None,
            pdfmonkey_base_url: DEFAULT_PDFMONKEY_BASE_URL.to_string(),
            template_id: None,
            preview_template_id: None,
            webhook_url: None,
            webhook_timeout: Duration::from_secs(5),
        }
    }
}

impl Settings {
    pub fn require_openai_key(&self) -> Result<&str, ConfigError> {
        present(&self.openai_api_key, "OPENAI_API_KEY")
    }

    pub fn require_pdfmonkey_key(&self) -> Result<&str, ConfigError> {
        present(&self.pdfmonkey_api_key, "PDFMONKEY_API_KEY")
    }

    /// Resolve the template id for a variant.
    pub fn template_for(&self, variant: TemplateVariant) -> Result<&str, ConfigError> {
        match variant {
            TemplateVariant::Full => present(&self.template_id, "PDFMONKEY_TEMPLATE_ID"),
            TemplateVariant::Preview => {
                present(&self.preview_template_id, "PDFMONKEY_PREVIEW_TEMPLATE_ID")
            }
        }
    }
}

fn present<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}
