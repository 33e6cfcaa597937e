//! The four scheduled actions.
//!
//! Each action resolves its prerequisites (an actor, seed content, a
//! category, a reply target), gives any missing one exactly one recovery
//! attempt, and otherwise ends as a logged skip. Collaborator failures
//! propagate as [`EngineError`].

use crate::directory::PersonaDirectory;
use crate::fallback::{or_fallback_once, retry_once_after};
use chrono::{DateTime, TimeDelta, Utc};
use marionette_core::config::ContentConfig;
use marionette_core::{
    Actor, ActionOutcome, ActorId, Category, CategoryResolver, ContentStore, EngineError,
    FeedItem, IdentityStore, MarionetteConfig, NewReply, NewThread, RandomSource, RecentTarget,
    ReplyDescriptor, SkipReason, ThreadDescriptor,
};
use marionette_expression::{style_new_post, style_reply};
use marionette_perception::FeedCache;
use std::sync::Arc;

/// Host-side collaborators the engine writes through.
#[derive(Clone)]
pub struct Collaborators {
    pub identities: Arc<dyn IdentityStore>,
    pub content: Arc<dyn ContentStore>,
    pub categories: Arc<dyn CategoryResolver>,
}

impl Collaborators {
    /// Use one host object for all three roles.
    pub fn from_host<H>(host: Arc<H>) -> Self
    where
        H: IdentityStore + ContentStore + CategoryResolver + 'static,
    {
        Self {
            identities: host.clone(),
            content: host.clone(),
            categories: host,
        }
    }
}

pub struct ActionEngine {
    directory: PersonaDirectory,
    feed: Arc<FeedCache>,
    content: Arc<dyn ContentStore>,
    categories: Arc<dyn CategoryResolver>,
    rng: Arc<dyn RandomSource>,
    settings: ContentConfig,
}

impl ActionEngine {
    pub fn new(
        collaborators: Collaborators,
        feed: Arc<FeedCache>,
        rng: Arc<dyn RandomSource>,
        config: &MarionetteConfig,
    ) -> Self {
        Self {
            directory: PersonaDirectory::new(
                collaborators.identities,
                rng.clone(),
                config.identity.clone(),
            ),
            feed,
            content: collaborators.content,
            categories: collaborators.categories,
            rng,
            settings: config.content.clone(),
        }
    }

    pub fn directory(&self) -> &PersonaDirectory {
        &self.directory
    }

    pub fn feed(&self) -> &Arc<FeedCache> {
        &self.feed
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Spawn one synthetic actor.
    pub async fn create_ai_user(&self) -> Result<ActorId, EngineError> {
        let actor = self.directory.spawn_actor().await?;
        Ok(actor.id)
    }

    /// Refresh the feed cache. Returns the number of items now being served
    /// from the new snapshot, or zero when the previous snapshot was kept.
    pub async fn refresh_feed(&self) -> Result<usize, EngineError> {
        self.feed.refresh().await
    }

    /// Post one styled thread seeded from the feed cache.
    pub async fn create_thread(&self) -> Result<ActionOutcome<ThreadDescriptor>, EngineError> {
        let Some(actor) = self.obtain_actor().await? else {
            return Ok(skip("create-thread", SkipReason::NoActor));
        };

        let Some(item) = self.obtain_seed().await? else {
            return Ok(skip("create-thread", SkipReason::NoContent));
        };

        let categories = self.postable_categories(actor.id).await?;
        if categories.is_empty() {
            tracing::warn!(actor_id = actor.id, "Actor may not post in any category");
            return Ok(skip("create-thread", SkipReason::NoCategory));
        }
        let category = &categories[self.rng.index(categories.len())];

        let post = style_new_post(&item.title, &item.body, actor.persona);
        let thread = NewThread {
            actor_id: actor.id,
            category_id: category.id,
            title: post.title,
            body: post.body,
            tags: self.settings.thread_tags.clone(),
        };
        let descriptor = self
            .content
            .create_thread(&thread)
            .await
            .map_err(|e| EngineError::store("create_thread", e))?;

        tracing::info!(
            thread_id = descriptor.thread_id,
            actor_id = actor.id,
            category = %category.name,
            source = %item.source_url,
            "Created thread"
        );
        Ok(ActionOutcome::Done(descriptor))
    }

    /// Post one persona-styled reply to a thread from the recent window.
    pub async fn create_reply(&self) -> Result<ActionOutcome<ReplyDescriptor>, EngineError> {
        let Some(actor) = self.obtain_actor().await? else {
            return Ok(skip("create-reply", SkipReason::NoActor));
        };

        let since = Utc::now() - TimeDelta::days(i64::from(self.settings.reply_window_days));
        let targets = retry_once_after(
            move || self.recent_targets(since),
            move || async move {
                tracing::info!("No recent threads to reply to, creating one");
                self.create_thread().await.map(|_| ())
            },
        )
        .await?;
        let Some(targets) = targets else {
            return Ok(skip("create-reply", SkipReason::NoReplyTarget));
        };
        let target = &targets[self.rng.index(targets.len())];

        let thread = self
            .content
            .get_thread(target.id)
            .await
            .map_err(|e| EngineError::store("get_thread", e))?;
        let Some(thread) = thread.filter(|t| !t.deleted) else {
            return Ok(skip("create-reply", SkipReason::TargetUnavailable));
        };
        let main_post = self
            .content
            .get_post(thread.main_post_id)
            .await
            .map_err(|e| EngineError::store("get_post", e))?;
        let Some(main_post) = main_post else {
            return Ok(skip("create-reply", SkipReason::TargetUnavailable));
        };

        let body = style_reply(&main_post.body, actor.persona, self.rng.as_ref());
        let reply = NewReply {
            thread_id: thread.id,
            actor_id: actor.id,
            body,
        };
        let descriptor = self
            .content
            .create_reply(&reply)
            .await
            .map_err(|e| EngineError::store("create_reply", e))?;

        tracing::info!(
            post_id = descriptor.post_id,
            thread_id = thread.id,
            actor_id = actor.id,
            "Created reply"
        );
        Ok(ActionOutcome::Done(descriptor))
    }

    // ========================================================================
    // Prerequisites
    // ========================================================================

    /// A random pool member, or a freshly spawned one when the pool is empty.
    async fn obtain_actor(&self) -> Result<Option<Actor>, EngineError> {
        or_fallback_once(self.directory.pick_random_actor(), move || async move {
            tracing::info!("No actors in pool, spawning one");
            let spawned = self.directory.spawn_actor().await?;
            self.directory.fetch_actor(spawned.id).await
        })
        .await
    }

    /// A random cached item, refreshing the cache once if it is empty.
    async fn obtain_seed(&self) -> Result<Option<FeedItem>, EngineError> {
        retry_once_after(
            move || async move { Ok(self.feed.draw_random(self.rng.as_ref())) },
            move || async move {
                tracing::info!("Feed cache empty, refreshing before posting");
                self.feed.refresh().await.map(|_| ())
            },
        )
        .await
    }

    async fn postable_categories(&self, actor: ActorId) -> Result<Vec<Category>, EngineError> {
        let listed = self
            .categories
            .list_categories(actor)
            .await
            .map_err(|e| EngineError::store("list_categories", e))?;

        let mut allowed = Vec::with_capacity(listed.len());
        for category in listed {
            let permitted = self
                .categories
                .can_create_thread(category.id, actor)
                .await
                .map_err(|e| EngineError::store("can_create_thread", e))?;
            if permitted {
                allowed.push(category);
            }
        }
        Ok(allowed)
    }

    /// Live threads created at or after `since`. `None` when there are none.
    async fn recent_targets(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Option<Vec<RecentTarget>>, EngineError> {
        let ids = self
            .content
            .list_threads_created_after(since)
            .await
            .map_err(|e| EngineError::store("list_threads_created_after", e))?;
        if ids.is_empty() {
            return Ok(None);
        }

        let targets: Vec<RecentTarget> = self
            .content
            .get_threads_data(&ids)
            .await
            .map_err(|e| EngineError::store("get_threads_data", e))?
            .into_iter()
            .filter(|t| !t.deleted && t.created_at >= since)
            .map(|t| RecentTarget {
                id: t.id,
                created_at: t.created_at,
                main_post_id: t.main_post_id,
            })
            .collect();

        Ok((!targets.is_empty()).then_some(targets))
    }
}

fn skip<T>(action: &'static str, reason: SkipReason) -> ActionOutcome<T> {
    tracing::warn!(action, %reason, "Skipping action");
    ActionOutcome::Skipped(reason)
}
