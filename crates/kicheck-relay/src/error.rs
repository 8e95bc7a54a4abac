use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("renderer returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("renderer response has no download_url")]
    MissingUrl,
}

impl RenderError {
    /// Diagnostic text to hand back to the caller.
    pub fn details(&self) -> String {
        match self {
            Self::Server { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {status}")]
    Status { status: u16 },

    #[error("webhook queue full")]
    QueueFull,

    #[error("webhook queue closed")]
    QueueClosed,
}
