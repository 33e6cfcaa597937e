//! Feed cache with all-or-nothing snapshot replacement.
//!
//! The held items live behind an [`ArcSwap`]: a refresh builds the new
//! snapshot off to the side and publishes it with a single pointer swap, so
//! a concurrent reader holds either the old snapshot or the new one in full.

use crate::filter::FeedFilter;
use arc_swap::ArcSwap;
use marionette_core::{EngineError, FeedItem, FeedSource, RandomSource};
use std::sync::Arc;

/// One generation of cached items. Never mutated once published.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub generation: u64,
    pub items: Vec<FeedItem>,
}

pub struct FeedCache {
    source: Arc<dyn FeedSource>,
    filter: FeedFilter,
    limit: usize,
    snapshot: ArcSwap<Snapshot>,
}

impl FeedCache {
    pub fn new(source: Arc<dyn FeedSource>, filter: FeedFilter, limit: usize) -> Self {
        Self {
            source,
            filter,
            limit,
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
        }
    }

    /// Fetch, filter and publish a new snapshot.
    ///
    /// Returns the number of qualifying items fetched. Zero means the feed had
    /// nothing usable and the previous snapshot is still being served.
    pub async fn refresh(&self) -> Result<usize, EngineError> {
        tracing::debug!(source = self.source.name(), "Refreshing feed cache");

        let raw = self
            .source
            .fetch_hot(self.limit)
            .await
            .map_err(|e| EngineError::transport(self.source.name(), e))?;
        let fetched = raw.len();
        let items = self.filter.apply(raw);

        if items.is_empty() {
            tracing::warn!(
                source = self.source.name(),
                fetched,
                "No suitable feed items found, keeping previous snapshot"
            );
            return Ok(0);
        }

        let count = items.len();
        let previous = self.snapshot.rcu(|current| Snapshot {
            generation: current.generation + 1,
            items: items.clone(),
        });
        tracing::info!(
            source = self.source.name(),
            fetched,
            kept = count,
            generation = previous.generation + 1,
            "Feed cache refreshed"
        );
        Ok(count)
    }

    /// Uniform draw from the current snapshot. `None` when nothing is cached.
    pub fn draw_random(&self, rng: &dyn RandomSource) -> Option<FeedItem> {
        let snapshot = self.snapshot.load();
        if snapshot.items.is_empty() {
            return None;
        }
        let idx = rng.index(snapshot.items.len());
        snapshot.items.get(idx).cloned()
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.load().generation
    }
}
