// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// User agent for API calls (classifier backends, notification channels).
pub const API_USER_AGENT: &str = concat!("threadwatch/", env!("CARGO_PKG_VERSION"));

/// Create a configured asynchronous HTTP client for scraping.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    client_with_timeout(&config.user_agent, config.timeout_secs)
}

/// Create a client with a specific user agent and request ceiling.
pub fn client_with_timeout(user_agent: &str, timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a URL and return its body, treating non-success statuses as errors.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::crawl(url, format!("status {status}")));
    }
    Ok(response.text().await?)
}

/// Fetch a URL and return its raw bytes, treating non-success statuses as errors.
pub async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::crawl(url, format!("status {status}")));
    }
    Ok(response.bytes().await?.to_vec())
}
