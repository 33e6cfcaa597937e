pub mod config;
pub mod error;
pub mod persona;
pub mod random;
pub mod schedule;

pub use config::MarionetteConfig;
pub use error::{ActionOutcome, EngineError, SkipReason};
pub use persona::{Archetype, Persona, PersonaRecord, Topic, CATALOG};
pub use random::{RandomSource, ScriptedRandom, SeededRandom, ThreadRandom};
pub use schedule::Cadence;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ActorId = u64;
pub type CategoryId = u64;
pub type ThreadId = u64;
pub type PostId = u64;

/// Attribute key holding the JSON-encoded [`PersonaRecord`].
pub const ATTR_PERSONA: &str = "persona";
/// Attribute key marking an identity as automated.
pub const ATTR_SYNTHETIC: &str = "synthetic";

// ============================================================================
// Domain types
// ============================================================================

/// A synthetic identity driving automated actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub username: String,
    /// `None` when the stored persona attribute is missing or unrecognized.
    pub persona: Option<Archetype>,
    pub created_at: DateTime<Utc>,
}

/// One item as delivered by the external feed, before filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFeedItem {
    pub title: String,
    pub selftext: String,
    pub permalink: String,
    pub score: i64,
    pub stickied: bool,
    pub distinguished: Option<String>,
    pub is_video: bool,
    pub over_18: bool,
}

/// Seed material held in the feed cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub body: String,
    pub source_url: String,
    pub popularity: i64,
}

/// Read-only view of an existing thread used as a reply target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTarget {
    pub id: ThreadId,
    pub created_at: DateTime<Utc>,
    pub main_post_id: PostId,
}

// ============================================================================
// Collaborator records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: ActorId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolOptions {
    pub description: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewThread {
    pub actor_id: ActorId,
    pub category_id: CategoryId,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReply {
    pub thread_id: ThreadId,
    pub actor_id: ActorId,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadDescriptor {
    pub thread_id: ThreadId,
    pub main_post_id: PostId,
    pub category_id: CategoryId,
    pub actor_id: ActorId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyDescriptor {
    pub post_id: PostId,
    pub thread_id: ThreadId,
    pub actor_id: ActorId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub id: ThreadId,
    pub title: String,
    pub category_id: CategoryId,
    pub author_id: ActorId,
    pub main_post_id: PostId,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: PostId,
    pub thread_id: ThreadId,
    pub author_id: ActorId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Collaborators
// ============================================================================

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn create_identity(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> anyhow::Result<ActorId>;
    async fn get_identity(&self, id: ActorId) -> anyhow::Result<Option<IdentityRecord>>;
    async fn set_attribute(&self, id: ActorId, key: &str, value: &str) -> anyhow::Result<()>;
    async fn pool_exists(&self, name: &str) -> anyhow::Result<bool>;
    async fn create_pool(&self, name: &str, opts: &PoolOptions) -> anyhow::Result<()>;
    async fn join_pool(&self, name: &str, id: ActorId) -> anyhow::Result<()>;
    async fn list_pool_members(&self, name: &str) -> anyhow::Result<Vec<ActorId>>;
    async fn pool_member_count(&self, name: &str) -> anyhow::Result<usize>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create_thread(&self, thread: &NewThread) -> anyhow::Result<ThreadDescriptor>;
    async fn create_reply(&self, reply: &NewReply) -> anyhow::Result<ReplyDescriptor>;
    async fn get_thread(&self, id: ThreadId) -> anyhow::Result<Option<ThreadRecord>>;
    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<PostRecord>>;
    async fn list_threads_created_after(&self, since: DateTime<Utc>)
        -> anyhow::Result<Vec<ThreadId>>;
    async fn get_threads_data(&self, ids: &[ThreadId]) -> anyhow::Result<Vec<ThreadRecord>>;
}

#[async_trait]
pub trait CategoryResolver: Send + Sync {
    async fn list_categories(&self, actor: ActorId) -> anyhow::Result<Vec<Category>>;
    async fn can_create_thread(&self, category: CategoryId, actor: ActorId)
        -> anyhow::Result<bool>;
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Short label for logs (e.g. "reddit:regretfulparents").
    fn name(&self) -> &str;

    /// Fetch up to `limit` of the currently popular items.
    async fn fetch_hot(&self, limit: usize) -> anyhow::Result<Vec<RawFeedItem>>;
}
