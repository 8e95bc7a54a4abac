//! Relay layer: document rendering via PDFMonkey, best-effort webhook delivery.

mod error;
pub mod render;
pub mod webhook;

pub use error::{RelayError, RenderError};
pub use render::{DocumentRenderer, DocumentRequest, PdfMonkeyClient};
pub use webhook::{HttpWebhook, WebhookDispatcher, WebhookSink};
