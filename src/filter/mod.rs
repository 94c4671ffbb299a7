//! Notification filter pipeline.
//!
//! Decides whether a stored item is worth a notification. Stages run in order
//! and stop at the first rejection:
//!
//! 1. keyword rule (comments only, when enabled)
//! 2. remote classifier (threads and comments, when enabled)
//!
//! A disabled stage passes everything through. The classifier's answer, when
//! there is one, becomes the annotation attached to the notification.

mod classifier;
mod keywords;
mod openai;
mod workers_ai;

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Comment, FilterConfig, Thread};

pub use classifier::{
    Classifier, END_MARKER, REJECT_ANSWER, build_classifier, clean_result, is_publishable,
};
pub use keywords::KeywordFilter;
pub use openai::OpenAiClassifier;
pub use workers_ai::WorkersAiClassifier;

/// Outcome of running an item through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Reject,
    /// Notify, with a possibly empty annotation
    Publish(String),
}

impl Verdict {
    pub fn is_publish(&self) -> bool {
        matches!(self, Verdict::Publish(_))
    }
}

/// Ordered keyword and classifier stages.
#[derive(Clone)]
pub struct FilterPipeline {
    keywords: Option<KeywordFilter>,
    classifier: Option<Arc<dyn Classifier>>,
    thread_prompt: String,
    comment_prompt: String,
}

impl FilterPipeline {
    /// Build the pipeline described by `config`.
    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        let keywords = config
            .use_keywords
            .then(|| KeywordFilter::new(&config.keywords_rule));
        if keywords.as_ref().is_some_and(KeywordFilter::is_empty) {
            log::warn!("Keyword filter enabled with an empty rule; no comment will match");
        }

        let classifier = if config.use_ai {
            Some(build_classifier(&config.ai)?)
        } else {
            None
        };

        Ok(Self {
            keywords,
            classifier,
            thread_prompt: config.thread_prompt.clone(),
            comment_prompt: config.comment_prompt.clone(),
        })
    }

    /// Pipeline with every stage disabled.
    pub fn passthrough() -> Self {
        Self {
            keywords: None,
            classifier: None,
            thread_prompt: String::new(),
            comment_prompt: String::new(),
        }
    }

    pub fn with_keywords(mut self, rule: &str) -> Self {
        self.keywords = Some(KeywordFilter::new(rule));
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub async fn check_thread(&self, thread: &Thread) -> Verdict {
        self.classify(&thread.classifier_text(), &self.thread_prompt, &thread.link)
            .await
    }

    pub async fn check_comment(&self, comment: &Comment) -> Verdict {
        if let Some(keywords) = &self.keywords {
            if !keywords.matches(&comment.message) {
                log::debug!("Comment {} rejected by keyword rule", comment.comment_id);
                return Verdict::Reject;
            }
        }
        self.classify(&comment.message, &self.comment_prompt, &comment.comment_id)
            .await
    }

    async fn classify(&self, text: &str, prompt: &str, item: &str) -> Verdict {
        let Some(classifier) = &self.classifier else {
            return Verdict::Publish(String::new());
        };

        match classifier.classify(text, prompt).await {
            Ok(answer) if classifier.is_valid_result(&answer) => Verdict::Publish(answer),
            Ok(_) => {
                log::debug!("{} rejected by {}", item, classifier.name());
                Verdict::Reject
            }
            Err(e) => {
                log::warn!("Classifier {} failed for {}: {}", classifier.name(), item, e);
                Verdict::Reject
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::error::AppError;

    /// Returns a canned answer and records every prompt it receives.
    struct CannedClassifier {
        answer: std::result::Result<String, String>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl CannedClassifier {
        fn answering(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(answer.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                answer: Err("connection reset".to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Classifier for CannedClassifier {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn classify(&self, content: &str, prompt: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((content.to_string(), prompt.to_string()));
            match &self.answer {
                Ok(answer) => Ok(clean_result(answer)),
                Err(e) => Err(AppError::classifier(e)),
            }
        }
    }

    fn thread() -> Thread {
        let now = Utc::now();
        Thread {
            link: "https://lowendtalk.com/discussion/1/x".into(),
            domain: "lowendtalk".into(),
            category: "offers".into(),
            title: "Cheap VPS".into(),
            description: "1GB RAM".into(),
            creator: "alice".into(),
            publish_time: now,
            first_seen_time: now,
            last_page_fetched: 0,
        }
    }

    fn comment(message: &str) -> Comment {
        let now = Utc::now();
        Comment {
            comment_id: "lowendtalk.com_1".into(),
            thread_link: "https://lowendtalk.com/discussion/1/x".into(),
            author: "alice".into(),
            role: None,
            message: message.into(),
            created_time: now,
            recorded_time: now,
            permalink: "https://lowendtalk.com/discussion/1/x/comment/1/#Comment_1".into(),
        }
    }

    fn pipeline() -> FilterPipeline {
        FilterPipeline {
            thread_prompt: "thread prompt".into(),
            comment_prompt: "comment prompt".into(),
            ..FilterPipeline::passthrough()
        }
    }

    #[tokio::test]
    async fn test_passthrough_publishes_without_annotation() {
        let filters = FilterPipeline::passthrough();
        assert_eq!(filters.check_thread(&thread()).await, Verdict::Publish(String::new()));
        assert_eq!(filters.check_comment(&comment("hi")).await, Verdict::Publish(String::new()));
    }

    #[tokio::test]
    async fn test_keyword_stage_applies_to_comments_only() {
        let filters = pipeline().with_keywords("restock");

        assert_eq!(filters.check_comment(&comment("nothing new")).await, Verdict::Reject);
        assert!(filters.check_comment(&comment("RESTOCK now")).await.is_publish());
        assert!(filters.check_thread(&thread()).await.is_publish());
    }

    #[tokio::test]
    async fn test_classifier_annotation_and_prompts() {
        let canned = CannedClassifier::answering("ok END trailing junk");
        let filters = pipeline().with_classifier(canned.clone());

        assert_eq!(filters.check_thread(&thread()).await, Verdict::Publish("ok".into()));
        assert_eq!(filters.check_comment(&comment("restock")).await, Verdict::Publish("ok".into()));

        let prompts = canned.prompts.lock().unwrap();
        assert_eq!(prompts[0], ("Cheap VPS\n\n1GB RAM".to_string(), "thread prompt".to_string()));
        assert_eq!(prompts[1], ("restock".to_string(), "comment prompt".to_string()));
    }

    #[tokio::test]
    async fn test_classifier_false_rejects() {
        let filters = pipeline().with_classifier(CannedClassifier::answering("  false "));
        assert_eq!(filters.check_thread(&thread()).await, Verdict::Reject);
    }

    #[tokio::test]
    async fn test_classifier_failure_rejects() {
        let filters = pipeline().with_classifier(CannedClassifier::failing());
        assert_eq!(filters.check_comment(&comment("restock")).await, Verdict::Reject);
    }

    #[tokio::test]
    async fn test_keyword_rejection_skips_classifier() {
        let canned = CannedClassifier::answering("ok");
        let filters = pipeline().with_keywords("nvme").with_classifier(canned.clone());

        assert_eq!(filters.check_comment(&comment("ssd only")).await, Verdict::Reject);
        assert!(canned.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_from_config_disabled_stages() {
        let filters = FilterPipeline::from_config(&FilterConfig::default()).unwrap();
        assert!(filters.keywords.is_none());
        assert!(filters.classifier.is_none());
    }
}
