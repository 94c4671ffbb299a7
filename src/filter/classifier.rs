//! Remote classifier contract and backend selection.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::{OpenAiClassifier, WorkersAiClassifier};
use crate::models::{AiConfig, AiProvider};

/// Marker the prompts ask the model to end with; anything after it is noise.
pub const END_MARKER: &str = "END";

/// Answer that means "not interesting".
pub const REJECT_ANSWER: &str = "FALSE";

/// A text-generation backend used as a filter stage.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Ask the backend about `content` under `prompt`. The returned text has
    /// already been cut at [`END_MARKER`] and trimmed.
    async fn classify(&self, content: &str, prompt: &str) -> Result<String>;

    fn is_valid_result(&self, result: &str) -> bool {
        is_publishable(result)
    }
}

/// Cut a raw answer at the first [`END_MARKER`] and trim it.
pub fn clean_result(raw: &str) -> String {
    let head = raw.find(END_MARKER).map_or(raw, |idx| &raw[..idx]);
    head.trim().to_string()
}

/// Every answer other than [`REJECT_ANSWER`] is publishable, empty included.
pub fn is_publishable(result: &str) -> bool {
    !result.trim().eq_ignore_ascii_case(REJECT_ANSWER)
}

/// Build the classifier selected by `config.provider`.
pub fn build_classifier(config: &AiConfig) -> Result<Arc<dyn Classifier>> {
    let classifier: Arc<dyn Classifier> = match config.provider {
        AiProvider::Cloudflare => Arc::new(WorkersAiClassifier::new(config)?),
        AiProvider::Openai => Arc::new(OpenAiClassifier::new(config)?),
    };
    log::info!("Classifier backend: {} ({})", classifier.name(), config.model);
    Ok(classifier)
}

/// Chat message shared by both backends' request bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

pub(crate) fn chat_messages(prompt: &str, content: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".into(),
            content: prompt.into(),
        },
        ChatMessage {
            role: "user".into(),
            content: content.into(),
        },
    ]
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_result_cuts_at_marker() {
        assert_eq!(clean_result("ok END trailing junk"), "ok");
        assert_eq!(clean_result("  plain answer \n"), "plain answer");
        assert_eq!(clean_result("END"), "");
    }

    #[test]
    fn test_false_is_not_publishable() {
        assert!(!is_publishable("FALSE"));
        assert!(!is_publishable("  false \n"));
        assert!(!is_publishable("False"));
        assert!(is_publishable("ok"));
        assert!(is_publishable(""));
        assert!(is_publishable("FALSE positive"));
    }

    #[test]
    fn test_build_classifier_selects_provider() {
        let mut config = AiConfig {
            model: "@cf/meta/llama-3-8b-instruct".into(),
            cf_account_id: "acct".into(),
            cf_token: "token".into(),
            ..AiConfig::default()
        };
        assert_eq!(build_classifier(&config).unwrap().name(), "workers-ai");

        config.provider = AiProvider::Openai;
        config.api_key = "sk-test".into();
        assert_eq!(build_classifier(&config).unwrap().name(), "openai");
    }
}
