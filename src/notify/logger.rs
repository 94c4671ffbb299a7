use async_trait::async_trait;

use crate::error::Result;
use crate::notify::Notifier;

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &str) -> Result<()> {
        log::info!("[notify] {}", message.replace('\n', " | "));
        Ok(())
    }
}
