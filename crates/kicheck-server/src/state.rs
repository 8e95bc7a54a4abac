use std::sync::Arc;

use kicheck_ai::{CompletionClient, OpenAiClient};
use kicheck_core::{ConfigError, FormVariant, Settings};
use kicheck_relay::webhook::DEFAULT_QUEUE_CAPACITY;
use kicheck_relay::{
    DocumentRenderer, HttpWebhook, PdfMonkeyClient, RelayError, WebhookDispatcher,
};
use tokio::task::JoinHandle;
use tracing::info;

/// Shared per-process state handed to every handler.
///
/// Collaborators are optional: a missing one turns into a configuration
/// error only for the endpoints that need it.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub form: Arc<FormVariant>,
    pub completion: Option<Arc<dyn CompletionClient>>,
    pub renderer: Option<Arc<dyn DocumentRenderer>>,
    pub webhook: Option<WebhookDispatcher>,
}

impl AppState {
    /// State with no collaborators attached.
    pub fn new(settings: Settings, form: FormVariant) -> Self {
        Self {
            settings: Arc::new(settings),
            form: Arc::new(form),
            completion: None,
            renderer: None,
            webhook: None,
        }
    }

    /// Wire up the production collaborators from settings.
    ///
    /// Must run inside a tokio runtime: the webhook dispatcher task is
    /// spawned here and its handle returned.
    pub fn from_settings(
        settings: Settings,
        form: FormVariant,
    ) -> Result<(Self, Option<JoinHandle<()>>), RelayError> {
        let completion = OpenAiClient::from_settings(&settings)
            .map(|c| Arc::new(c) as Arc<dyn CompletionClient>);
        let renderer = PdfMonkeyClient::from_settings(&settings)
            .map(|r| Arc::new(r) as Arc<dyn DocumentRenderer>);

        let mut webhook_task = None;
        let webhook = match settings.webhook_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => {
                let sink = HttpWebhook::new(url.to_string(), settings.webhook_timeout)?;
                let (dispatcher, handle) =
                    WebhookDispatcher::spawn(Arc::new(sink), DEFAULT_QUEUE_CAPACITY);
                webhook_task = Some(handle);
                Some(dispatcher)
            }
            None => None,
        };

        info!(
            form = %form.name,
            completion = completion.is_some(),
            rendering = renderer.is_some(),
            webhook = webhook.is_some(),
            "collaborators configured"
        );

        let state = Self {
            completion,
            renderer,
            webhook,
            ..Self::new(settings, form)
        };
        Ok((state, webhook_task))
    }

    pub fn with_completion(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.completion = Some(client);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_webhook(mut self, dispatcher: WebhookDispatcher) -> Self {
        self.webhook = Some(dispatcher);
        self
    }

    pub fn completion(&self) -> Result<&dyn CompletionClient, ConfigError> {
        self.completion
            .as_deref()
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))
    }

    pub fn renderer(&self) -> Result<&dyn DocumentRenderer, ConfigError> {
        self.renderer
            .as_deref()
            .ok_or(ConfigError::Missing("PDFMONKEY_API_KEY"))
    }
}
