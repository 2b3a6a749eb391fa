//! Fire-and-forget contact sync to marketing platforms after a sale.

pub mod brevo;
pub mod contact;
pub mod manychat;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::MarketingConfig;

pub use contact::Contact;

#[derive(Debug)]
pub struct SinkError {
    pub message: String,
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for SinkError {
    fn from(s: String) -> Self {
        SinkError { message: s }
    }
}

impl From<&str> for SinkError {
    fn from(s: &str) -> Self {
        SinkError {
            message: s.to_string(),
        }
    }
}

#[async_trait]
pub trait ContactSink: Send + Sync {
    fn id(&self) -> &str;
    fn is_configured(&self) -> bool;
    async fn sync_contact(&self, contact: &Contact) -> Result<(), SinkError>;
    /// Probe the platform with the configured credentials.
    async fn check(&self) -> Result<(), SinkError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkStatus {
    pub id: String,
    pub configured: bool,
    pub api_works: bool,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct SinkRegistry {
    sinks: Vec<Arc<dyn ContactSink>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Registers every sink the deployment knows about; unconfigured ones stay
    /// listed so the status report can say so.
    pub fn from_config(config: &MarketingConfig) -> Self {
        let mut registry = Self::new();

        match brevo::BrevoSink::new(config.brevo_api_key.clone(), config.brevo_list_id) {
            Ok(sink) => registry.register(Arc::new(sink)),
            Err(e) => tracing::warn!("Brevo sync not available: {e}"),
        }

        match manychat::ManyChatSink::new(
            config.manychat_api_token.clone(),
            config.manychat_tag.clone(),
        ) {
            Ok(sink) => registry.register(Arc::new(sink)),
            Err(e) => tracing::warn!("ManyChat sync not available: {e}"),
        }

        registry
    }

    pub fn register(&mut self, sink: Arc<dyn ContactSink>) {
        self.sinks.push(sink);
    }

    pub fn list(&self) -> &[Arc<dyn ContactSink>] {
        &self.sinks
    }

    /// Spawn one sync task per configured sink. Never blocks the caller.
    pub fn dispatch(&self, contact: Contact) {
        let contact = Arc::new(contact);
        for sink in self.sinks.iter().filter(|s| s.is_configured()) {
            let sink = Arc::clone(sink);
            let contact = Arc::clone(&contact);
            tokio::spawn(async move {
                match sink.sync_contact(&contact).await {
                    Ok(()) => tracing::info!(sink = sink.id(), "Contact synced"),
                    Err(e) => tracing::error!(sink = sink.id(), "Contact sync failed: {e}"),
                }
            });
        }
    }

    pub async fn status(&self) -> Vec<SinkStatus> {
        let mut report = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            let configured = sink.is_configured();
            let (api_works, error) = if configured {
                match sink.check().await {
                    Ok(()) => (true, None),
                    Err(e) => (false, Some(e.message)),
                }
            } else {
                (false, None)
            };
            report.push(SinkStatus {
                id: sink.id().to_string(),
                configured,
                api_works,
                error,
            });
        }
        report
    }
}
