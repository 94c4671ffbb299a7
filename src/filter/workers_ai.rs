//! Cloudflare Workers AI backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::filter::Classifier;
use crate::filter::classifier::{ChatChoice, ChatMessage, chat_messages, clean_result};
use crate::models::AiConfig;
use crate::utils::http::{API_USER_AGENT, client_with_timeout};

const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";

#[derive(Serialize)]
struct RunRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    #[serde(default)]
    result: Option<RunResult>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// Text models answer with `response`; chat-style models with `choices`.
#[derive(Debug, Default, Deserialize)]
struct RunResult {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

impl RunResult {
    fn into_text(self) -> Option<String> {
        self.response.or_else(|| {
            self.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
        })
    }
}

/// Classifier backed by the Workers AI `ai/run` endpoint.
pub struct WorkersAiClassifier {
    client: Client,
    base_url: String,
    account_id: String,
    token: String,
    model: String,
}

impl WorkersAiClassifier {
    pub fn new(config: &AiConfig) -> Result<Self> {
        Ok(Self {
            client: client_with_timeout(API_USER_AGENT, config.timeout_secs)?,
            base_url: CF_API_BASE.to_string(),
            account_id: config.cf_account_id.clone(),
            token: config.cf_token.clone(),
            model: config.model.clone(),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url, self.account_id, self.model
        )
    }
}

#[async_trait]
impl Classifier for WorkersAiClassifier {
    fn name(&self) -> &'static str {
        "workers-ai"
    }

    async fn classify(&self, content: &str, prompt: &str) -> Result<String> {
        let request = RunRequest {
            messages: chat_messages(prompt, content),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: RunResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::classifier(format!("workers-ai returned unreadable body ({status}): {e}"))
        })?;

        if !parsed.success || !parsed.errors.is_empty() {
            return Err(AppError::classifier(format!(
                "workers-ai reported failure ({status}): {:?}",
                parsed.errors
            )));
        }

        let text = parsed
            .result
            .and_then(RunResult::into_text)
            .ok_or_else(|| AppError::classifier("workers-ai returned no answer"))?;

        let cleaned = clean_result(&text);
        log::debug!("workers-ai answer: {}", cleaned);
        Ok(cleaned)
    }
}
