//! End-to-end action tests against the in-memory host.

use chrono::{TimeDelta, Utc};
use marionette_core::{
    ActionOutcome, Archetype, EngineError, FeedSource, IdentityStore, MarionetteConfig,
    RandomSource, RawFeedItem, SkipReason, ThreadRandom, ATTR_PERSONA, ATTR_SYNTHETIC,
};
use marionette_engine::{ActionEngine, Collaborators, InMemoryHost, StatusReporter};
use marionette_perception::{FeedCache, FeedFilter, FixtureSource};
use std::sync::Arc;

struct Harness {
    host: Arc<InMemoryHost>,
    source: Arc<FixtureSource>,
    engine: Arc<ActionEngine>,
}

fn story(title: &str) -> RawFeedItem {
    RawFeedItem {
        title: title.to_string(),
        selftext: format!(
            "{} I love my kids but some days I wonder who I would have been. {}",
            title,
            "The days blur together and nothing feels like mine anymore. ".repeat(2)
        ),
        permalink: format!("https://www.reddit.com/r/regretfulparents/comments/{}/", title),
        score: 42,
        ..Default::default()
    }
}

fn harness_with(host: InMemoryHost, items: Vec<RawFeedItem>, rng: Arc<dyn RandomSource>) -> Harness {
    let host = Arc::new(host);
    let source = Arc::new(FixtureSource::new("fixture", items));
    let feed_source: Arc<dyn FeedSource> = source.clone();
    let feed = Arc::new(FeedCache::new(feed_source, FeedFilter::default(), 100));
    let engine = Arc::new(ActionEngine::new(
        Collaborators::from_host(host.clone()),
        feed,
        rng,
        &MarionetteConfig::default(),
    ));
    Harness {
        host,
        source,
        engine,
    }
}

fn harness(items: Vec<RawFeedItem>) -> Harness {
    harness_with(
        InMemoryHost::with_default_category(),
        items,
        Arc::new(ThreadRandom),
    )
}

// ============================================================================
// create_ai_user
// ============================================================================

#[tokio::test]
async fn test_create_ai_user_registers_tagged_member() {
    let h = harness(vec![]);
    let id = h.engine.create_ai_user().await.unwrap();

    let identity = h.host.identity(id).unwrap();
    assert!(identity.username.starts_with("parent_"));
    assert_eq!(identity.attributes[ATTR_SYNTHETIC], "true");
    assert!(identity.attributes.contains_key(ATTR_PERSONA));
    assert_eq!(h.host.pool("ai-users").unwrap().members, vec![id]);
}

#[tokio::test]
async fn test_identity_rejection_leaves_no_partial_actor() {
    let h = harness(vec![story("a")]);
    h.host.fail_next("create_identity");

    let err = h.engine.create_ai_user().await.unwrap_err();
    assert!(matches!(err, EngineError::IdentityCreation { .. }));
    assert_eq!(h.host.identity_count(), 0);
    assert_eq!(h.host.attribute_writes(), 0);
    assert!(h.host.pool("ai-users").is_none());
}

// ============================================================================
// create_thread
// ============================================================================

#[tokio::test]
async fn test_thread_with_empty_pool_spawns_exactly_one_author() {
    let h = harness(vec![story("first")]);

    let outcome = h.engine.create_thread().await.unwrap();
    let thread = outcome.done().expect("thread should be created");

    let members = h.host.pool("ai-users").unwrap().members;
    assert_eq!(members, vec![thread.actor_id]);
    assert_eq!(h.host.identity_count(), 1);
    assert_eq!(thread.title, "first");
    assert_eq!(
        h.host.thread_tags(thread.thread_id),
        vec!["regret".to_string(), "parenting".to_string()]
    );

    // Body is the seed wrapped in the author's voice
    let identity = h.host.identity(thread.actor_id).unwrap();
    let record = marionette_core::PersonaRecord::decode(&identity.attributes[ATTR_PERSONA]).unwrap();
    let body = h.host.post_body(thread.main_post_id).unwrap();
    assert!(body.starts_with(record.archetype.persona().opening));
    assert!(body.contains("I love my kids"));
}

#[tokio::test]
async fn test_thread_refreshes_empty_cache_once() {
    let h = harness(vec![story("seed")]);
    assert!(h.engine.feed().is_empty());

    let outcome = h.engine.create_thread().await.unwrap();
    assert!(outcome.is_done());
    assert_eq!(h.source.fetches(), 1);
    assert_eq!(h.engine.feed().generation(), 1);

    // Cache is warm now; no further fetch.
    h.engine.create_thread().await.unwrap();
    assert_eq!(h.source.fetches(), 1);
}

#[tokio::test]
async fn test_thread_skips_when_feed_has_nothing_usable() {
    let mut pinned = story("pinned");
    pinned.stickied = true;
    let h = harness(vec![pinned]);

    let outcome = h.engine.create_thread().await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Skipped(SkipReason::NoContent)));
    assert_eq!(h.source.fetches(), 1);
    assert!(h.host.threads().is_empty());
}

#[tokio::test]
async fn test_thread_propagates_feed_transport_failure() {
    let h = harness(vec![story("x")]);
    h.source.fail_next("connection reset");

    let err = h.engine.create_thread().await.unwrap_err();
    assert!(matches!(err, EngineError::Transport { .. }));
    assert!(h.host.threads().is_empty());
}

#[tokio::test]
async fn test_thread_skips_without_postable_category() {
    let host = InMemoryHost::new();
    host.add_category("Announcements", false);
    let h = harness_with(host, vec![story("x")], Arc::new(ThreadRandom));

    let outcome = h.engine.create_thread().await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Skipped(SkipReason::NoCategory)));
    assert!(h.host.threads().is_empty());
}

#[tokio::test]
async fn test_thread_only_lands_in_permitted_categories() {
    let host = InMemoryHost::new();
    host.add_category("Announcements", false);
    let open = host.add_category("Stories", true);
    let h = harness_with(host, vec![story("x")], Arc::new(ThreadRandom));

    for _ in 0..5 {
        let thread = h.engine.create_thread().await.unwrap().done().unwrap();
        assert_eq!(thread.category_id, open);
    }
}

#[tokio::test]
async fn test_thread_by_persona_less_actor_is_unstyled() {
    let h = harness(vec![story("plain")]);
    let id = h.engine.create_ai_user().await.unwrap();
    h.host.set_attribute(id, ATTR_PERSONA, "garbage").await.unwrap();

    let thread = h.engine.create_thread().await.unwrap().done().unwrap();
    let body = h.host.post_body(thread.main_post_id).unwrap();
    assert_eq!(body, story("plain").selftext);
}

#[tokio::test]
async fn test_store_failure_surfaces_as_error() {
    let h = harness(vec![story("x")]);
    h.host.fail_next("create_thread");

    let err = h.engine.create_thread().await.unwrap_err();
    assert!(matches!(err, EngineError::Store { operation: "create_thread", .. }));
}

// ============================================================================
// create_reply
// ============================================================================

#[tokio::test]
async fn test_reply_creates_fresh_target_instead_of_old_thread() {
    let host = InMemoryHost::with_default_category();
    let old = host.seed_thread(999, 1, "old", "ancient history", Utc::now() - TimeDelta::days(10));
    let h = harness_with(host, vec![story("fresh")], Arc::new(ThreadRandom));

    let reply = h.engine.create_reply().await.unwrap().done().unwrap();

    assert_ne!(reply.thread_id, old.thread_id);
    assert!(h.host.replies(old.thread_id).is_empty());
    assert_eq!(h.host.replies(reply.thread_id).len(), 1);
    assert_eq!(h.host.threads().len(), 2);
    assert_eq!(h.host.identity_count(), 1);
}

#[tokio::test]
async fn test_reply_ignores_deleted_threads() {
    let host = InMemoryHost::with_default_category();
    let gone = host.seed_thread(999, 1, "gone", "deleted body", Utc::now() - TimeDelta::hours(1));
    host.delete_thread(gone.thread_id);
    let h = harness_with(host, vec![story("fresh")], Arc::new(ThreadRandom));

    let reply = h.engine.create_reply().await.unwrap().done().unwrap();
    assert_ne!(reply.thread_id, gone.thread_id);
    assert!(h.host.replies(gone.thread_id).is_empty());
}

#[tokio::test]
async fn test_reply_skips_when_no_target_can_be_made() {
    // No categories at all, so the recovery thread cannot be created.
    let h = harness_with(InMemoryHost::new(), vec![story("x")], Arc::new(ThreadRandom));

    let outcome = h.engine.create_reply().await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Skipped(SkipReason::NoReplyTarget)));
    assert!(h.host.threads().is_empty());
}

#[tokio::test]
async fn test_reply_skips_when_main_post_vanished() {
    let host = InMemoryHost::with_default_category();
    let t = host.seed_thread(999, 1, "t", "my partner never helps", Utc::now());
    host.remove_post(t.main_post_id);
    let h = harness_with(host, vec![], Arc::new(ThreadRandom));

    let outcome = h.engine.create_reply().await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Skipped(SkipReason::TargetUnavailable)));
    assert!(h.host.replies(t.thread_id).is_empty());
}

#[tokio::test]
async fn test_reply_text_comes_from_author_voice() {
    let host = InMemoryHost::with_default_category();
    let t = host.seed_thread(999, 1, "t", "The financial stress is crushing us", Utc::now());
    let h = harness_with(host, vec![], Arc::new(ThreadRandom));
    let actor = h.engine.create_ai_user().await.unwrap();

    let reply = h.engine.create_reply().await.unwrap().done().unwrap();
    assert_eq!(reply.thread_id, t.thread_id);
    assert_eq!(reply.actor_id, actor);

    let identity = h.host.identity(actor).unwrap();
    let archetype = marionette_core::PersonaRecord::decode(&identity.attributes[ATTR_PERSONA])
        .unwrap()
        .archetype;
    let topics = marionette_expression::extract_topics("The financial stress is crushing us");
    let pool = marionette_expression::reply_candidates(Some(archetype), &topics);
    let body = h.host.replies(t.thread_id)[0].body.clone();
    assert!(pool.contains(&body.as_str()));
}

#[tokio::test]
async fn test_persona_less_reply_uses_sympathetic_voice() {
    let host = InMemoryHost::with_default_category();
    let t = host.seed_thread(999, 1, "t", "nothing in particular", Utc::now());
    let h = harness_with(host, vec![], Arc::new(ThreadRandom));
    let actor = h.engine.create_ai_user().await.unwrap();
    h.host.set_attribute(actor, ATTR_PERSONA, "").await.unwrap();

    h.engine.create_reply().await.unwrap().done().unwrap();
    let body = h.host.replies(t.thread_id)[0].body.clone();
    assert!(Archetype::Sympathetic
        .persona()
        .base_replies
        .contains(&body.as_str()));
}

// ============================================================================
// refresh_feed & status
// ============================================================================

#[tokio::test]
async fn test_refresh_keeps_only_qualifying_items() {
    let mut items: Vec<RawFeedItem> = (0..5).map(|i| story(&format!("ok{}", i))).collect();
    for i in 0..3 {
        let mut pinned = story(&format!("pinned{}", i));
        pinned.stickied = true;
        items.push(pinned);
    }
    for i in 0..2 {
        let mut short = story(&format!("short{}", i));
        short.selftext = "too short".to_string();
        items.push(short);
    }
    let h = harness(items);

    assert_eq!(h.engine.refresh_feed().await.unwrap(), 5);
    let snapshot = h.engine.feed().snapshot();
    assert_eq!(snapshot.items.len(), 5);
    assert!(snapshot.items.iter().all(|i| i.title.starts_with("ok")));
}

#[tokio::test]
async fn test_empty_refresh_serves_previous_snapshot() {
    let h = harness(vec![story("keep")]);
    h.engine.refresh_feed().await.unwrap();

    h.source.set_items(vec![]);
    assert_eq!(h.engine.refresh_feed().await.unwrap(), 0);
    assert_eq!(h.engine.feed().len(), 1);
    assert_eq!(h.engine.feed().generation(), 1);
}

#[tokio::test]
async fn test_status_reflects_pool_and_cache() {
    let h = harness(vec![story("a"), story("b")]);
    let reporter = StatusReporter::new(h.engine.clone());

    let before = reporter.report(None).await.unwrap();
    assert_eq!(before.actor_pool_size, 0);
    assert_eq!(before.feed_cache_size, 0);
    assert_eq!(before.active_job_count, 0);

    h.engine.create_ai_user().await.unwrap();
    h.engine.create_ai_user().await.unwrap();
    h.engine.refresh_feed().await.unwrap();

    let after = reporter.report(None).await.unwrap();
    assert_eq!(after.actor_pool_size, 2);
    assert_eq!(after.feed_cache_size, 2);
    assert_eq!(after.feed_generation, 1);
}
