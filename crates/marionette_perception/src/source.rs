use anyhow::Result;
use async_trait::async_trait;
use marionette_core::{FeedSource, RawFeedItem};
use std::sync::Mutex;
use url::Url;

/// Validates that a feed base URL is fetchable (HTTP/HTTPS with a host).
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("Only HTTP/HTTPS schemes are allowed");
    }
    if parsed.host_str().is_none() {
        anyhow::bail!("Feed URL has no host: {}", url);
    }

    Ok(parsed)
}

/// In-process feed with a swappable batch. Useful for offline runs and tests.
///
/// `fail_next` makes the next fetch return a transport error once.
pub struct FixtureSource {
    name: String,
    items: Mutex<Vec<RawFeedItem>>,
    fail_next: Mutex<Option<String>>,
    fetches: Mutex<usize>,
}

impl FixtureSource {
    pub fn new(name: &str, items: Vec<RawFeedItem>) -> Self {
        Self {
            name: name.to_string(),
            items: Mutex::new(items),
            fail_next: Mutex::new(None),
            fetches: Mutex::new(0),
        }
    }

    pub fn set_items(&self, items: Vec<RawFeedItem>) {
        *self.items.lock().unwrap_or_else(|e| e.into_inner()) = items;
    }

    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.to_string());
    }

    /// Number of fetches served so far, failed ones included.
    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FeedSource for FixtureSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_hot(&self, limit: usize) -> Result<Vec<RawFeedItem>> {
        *self.fetches.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        if let Some(msg) = self.fail_next.lock().unwrap_or_else(|e| e.into_inner()).take() {
            anyhow::bail!(msg);
        }
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(items.iter().take(limit).cloned().collect())
    }
}
