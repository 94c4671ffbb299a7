//! Notification channels.
//!
//! Every channel implements [`Notifier::send`] for an already formatted
//! message; the thread and comment entry points render the shared templates
//! from [`message`] first.

pub mod message;

mod logger;
mod telegram;
mod webhook;
mod wechat;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Comment, NoticeKind, NotifierConfig, Thread};

pub use logger::LogNotifier;
pub use message::{DISPLAY_LIMIT, format_comment_message, format_thread_message};
pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;
pub use wechat::WeChatNotifier;

/// A delivery channel for formatted messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &'static str;

    async fn send(&self, message: &str) -> Result<()>;

    async fn send_thread(&self, thread: &Thread, annotation: &str) -> Result<()> {
        self.send(&format_thread_message(thread, annotation)).await
    }

    async fn send_comment(&self, thread: &Thread, comment: &Comment, annotation: &str) -> Result<()> {
        self.send(&format_comment_message(thread, comment, annotation))
            .await
    }
}

/// Build the channel selected by `config.kind`.
pub fn build_notifier(config: &NotifierConfig) -> Result<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> = match config.kind {
        NoticeKind::Telegram => Arc::new(TelegramNotifier::new(config)?),
        NoticeKind::Wechat => Arc::new(WeChatNotifier::new(config)?),
        NoticeKind::Custom => Arc::new(WebhookNotifier::new(config)?),
        NoticeKind::Log => Arc::new(LogNotifier),
    };
    log::info!("Notification channel: {}", notifier.name());
    Ok(notifier)
}
