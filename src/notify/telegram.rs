//! Telegram Bot API channel.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::NotifierConfig;
use crate::notify::Notifier;
use crate::utils::http::{API_USER_AGENT, client_with_timeout};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        Ok(Self {
            client: client_with_timeout(API_USER_AGENT, config.timeout_secs)?,
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token: config.telegram_bot.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    pub fn with_api_base(mut self, url: &str) -> Self {
        self.api_base = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, message: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let response = self
            .client
            .post(&url)
            .form(&[("chat_id", self.chat_id.as_str()), ("text", message)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!(
                "telegram API error ({status}): {body}"
            )));
        }

        log::info!("Telegram message delivered to {}", self.chat_id);
        Ok(())
    }
}
