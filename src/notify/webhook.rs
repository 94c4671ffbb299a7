//! User-defined webhook channel.
//!
//! The configured URL carries a `{message}` placeholder that is replaced by
//! the URL-encoded message before a GET request is issued.

use async_trait::async_trait;
use reqwest::Client;
use url::form_urlencoded;

use crate::error::{AppError, Result};
use crate::models::NotifierConfig;
use crate::notify::Notifier;
use crate::utils::http::{API_USER_AGENT, client_with_timeout};

pub const MESSAGE_PLACEHOLDER: &str = "{message}";

pub struct WebhookNotifier {
    client: Client,
    template: String,
}

impl WebhookNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        if !config.custom_url.contains(MESSAGE_PLACEHOLDER) {
            log::warn!(
                "notifier.custom_url has no {} placeholder; messages will not be included",
                MESSAGE_PLACEHOLDER
            );
        }
        Ok(Self {
            client: client_with_timeout(API_USER_AGENT, config.timeout_secs)?,
            template: config.custom_url.clone(),
        })
    }

    fn render(&self, message: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
        self.template.replace(MESSAGE_PLACEHOLDER, &encoded)
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, message: &str) -> Result<()> {
        let response = self.client.get(self.render(message)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::notify(format!("webhook returned status {status}")));
        }

        log::info!("Webhook notification delivered");
        Ok(())
    }
}
