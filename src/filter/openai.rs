//! OpenAI-compatible chat completions backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::filter::Classifier;
use crate::filter::classifier::{ChatChoice, ChatMessage, chat_messages, clean_result};
use crate::models::AiConfig;
use crate::utils::http::{API_USER_AGENT, client_with_timeout};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// Classifier backed by any `/chat/completions` compatible endpoint.
pub struct OpenAiClassifier {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClassifier {
    pub fn new(config: &AiConfig) -> Result<Self> {
        Ok(Self {
            client: client_with_timeout(API_USER_AGENT, config.timeout_secs)?,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn classify(&self, content: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: chat_messages(prompt, content),
        };

        log::debug!("openai chat request, model {}", self.model);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::classifier(format!(
                "openai API error ({status}): {error_text}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::classifier(format!("openai returned unreadable body: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::classifier("openai returned no choices"))?;

        Ok(clean_result(&text))
    }
}
