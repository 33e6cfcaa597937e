use crate::source::validate_url;
use anyhow::{Context, Result};
use async_trait::async_trait;
use marionette_core::config::FeedConfig;
use marionette_core::{FeedSource, RawFeedItem};
use serde::Deserialize;
use std::time::Duration;

/// Hot listing of one subreddit, fetched as JSON.
pub struct RedditHotSource {
    site_url: String,
    subreddit: String,
    name: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RawFeedItem,
}

impl RedditHotSource {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        validate_url(&config.site_url)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            site_url: config.site_url.trim_end_matches('/').to_string(),
            subreddit: config.subreddit.clone(),
            name: format!("reddit:{}", config.subreddit),
            client,
        })
    }

    fn listing_url(&self) -> String {
        format!("{}/r/{}/hot.json", self.site_url, self.subreddit)
    }

    fn absolute(&self, permalink: &str) -> String {
        if permalink.starts_with('/') {
            format!("{}{}", self.site_url, permalink)
        } else {
            permalink.to_string()
        }
    }
}

#[async_trait]
impl FeedSource for RedditHotSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_hot(&self, limit: usize) -> Result<Vec<RawFeedItem>> {
        let response = self
            .client
            .get(self.listing_url())
            .query(&[("limit", limit)])
            .send()
            .await
            .context("Failed to fetch feed listing")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Feed responded with {}", status);
        }

        let listing: Listing = response
            .json()
            .await
            .context("Failed to parse feed listing")?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|c| {
                let mut item = c.data;
                item.permalink = self.absolute(&item.permalink);
                item
            })
            .collect())
    }
}
