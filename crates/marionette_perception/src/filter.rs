use marionette_core::{FeedItem, RawFeedItem};

/// Inclusion policy applied before items reach the cache.
#[derive(Debug, Clone, Copy)]
pub struct FeedFilter {
    pub min_body_chars: usize,
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self { min_body_chars: 100 }
    }
}

impl FeedFilter {
    pub fn new(min_body_chars: usize) -> Self {
        Self { min_body_chars }
    }

    /// Pinned, moderator-distinguished, video, adult and short posts are rejected.
    pub fn admits(&self, raw: &RawFeedItem) -> bool {
        !raw.stickied
            && raw.distinguished.is_none()
            && !raw.is_video
            && !raw.over_18
            && raw.selftext.chars().count() >= self.min_body_chars
    }

    /// Filter and convert a batch, preserving feed order.
    pub fn apply(&self, raw: Vec<RawFeedItem>) -> Vec<FeedItem> {
        raw.into_iter()
            .filter(|r| self.admits(r))
            .map(|r| FeedItem {
                title: r.title,
                body: r.selftext,
                source_url: r.permalink,
                popularity: r.score,
            })
            .collect()
    }
}
