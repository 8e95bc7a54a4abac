//! Best-effort webhook relay.
//!
//! Payloads are queued on a bounded channel and delivered by a detached
//! background task. Neither a full queue nor a failed delivery ever reaches
//! the request that produced the payload; both are logged here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::RelayError;

/// Default number of payloads buffered before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[async_trait]
pub trait WebhookSink: Send + Sync {
    async fn deliver(&self, payload: &Value) -> Result<(), RelayError>;
}

/// Posts payloads as JSON to a fixed URL.
pub struct HttpWebhook {
    client: reqwest::Client,
    url: String,
}

impl HttpWebhook {
    pub fn new(url: String, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl WebhookSink for HttpWebhook {
    async fn deliver(&self, payload: &Value) -> Result<(), RelayError> {
        let resp = self.client.post(&self.url).json(payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Handle for queueing webhook payloads. Cheap to clone.
#[derive(Clone)]
pub struct WebhookDispatcher {
    tx: mpsc::Sender<Value>,
}

impl WebhookDispatcher {
    /// Start the delivery task. It runs until every dispatcher handle is dropped.
    pub fn spawn(sink: Arc<dyn WebhookSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Value>(capacity.max(1));
        let handle = tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                match sink.deliver(&payload).await {
                    Ok(()) => debug!("webhook delivered"),
                    Err(e) => warn!(error = %e, "webhook delivery failed"),
                }
            }
            info!("webhook dispatcher stopped");
        });
        (Self { tx }, handle)
    }

    /// Queue a payload without waiting.
    pub fn dispatch(&self, payload: Value) -> Result<(), RelayError> {
        let err = match self.tx.try_send(payload) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(_)) => RelayError::QueueFull,
            Err(TrySendError::Closed(_)) => RelayError::QueueClosed,
        };
        warn!(error = %err, "webhook payload dropped");
        Err(err)
    }
}
