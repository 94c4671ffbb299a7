//! WeChat push via the xizhi service.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::NotifierConfig;
use crate::notify::Notifier;
use crate::utils::http::{API_USER_AGENT, client_with_timeout};

const XIZHI_API_BASE: &str = "https://xizhi.qqoq.net";
const MESSAGE_TITLE: &str = "threadwatch update";

pub struct WeChatNotifier {
    client: Client,
    api_base: String,
    key: String,
}

impl WeChatNotifier {
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        Ok(Self {
            client: client_with_timeout(API_USER_AGENT, config.timeout_secs)?,
            api_base: XIZHI_API_BASE.to_string(),
            key: config.wechat_key.clone(),
        })
    }

    pub fn with_api_base(mut self, url: &str) -> Self {
        self.api_base = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Notifier for WeChatNotifier {
    fn name(&self) -> &'static str {
        "wechat"
    }

    async fn send(&self, message: &str) -> Result<()> {
        let url = format!("{}/{}.send", self.api_base, self.key);
        let response = self
            .client
            .get(&url)
            .query(&[("title", MESSAGE_TITLE), ("content", message)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::notify(format!("wechat push failed: status {status}")));
        }

        log::info!("WeChat message delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_send_uses_key_path_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/XZkey.send"))
            .and(query_param("title", MESSAGE_TITLE))
            .and(query_param("content", "line one\nline two"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = NotifierConfig {
            wechat_key: "XZkey".into(),
            ..NotifierConfig::default()
        };
        let notifier = WeChatNotifier::new(&config)
            .unwrap()
            .with_api_base(&server.uri());

        notifier.send("line one\nline two").await.unwrap();
    }
}
