//! Scheduler timing tests. All run on a paused tokio clock.

use marionette_core::{Cadence, FeedSource, MarionetteConfig, RawFeedItem, ThreadRandom};
use marionette_engine::{boot, ActionEngine, Collaborators, InMemoryHost, JobSpec, Scheduler};
use marionette_perception::{FeedCache, FeedFilter, FixtureSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

fn hourly() -> Cadence {
    Cadence::every(HOUR)
}

fn counting_job(name: &str, counter: Arc<AtomicUsize>) -> JobSpec {
    JobSpec::new(name, hourly(), move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

fn explode() -> anyhow::Result<()> {
    panic!("job body exploded")
}

fn status_of<'a>(jobs: &'a [marionette_engine::JobStatus], name: &str) -> &'a marionette_engine::JobStatus {
    jobs.iter().find(|j| j.name == name).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_jobs_fire_on_cadence() {
    let fired = Arc::new(AtomicUsize::new(0));
    let mut scheduler = Scheduler::new(vec![counting_job("tick", fired.clone())]);
    scheduler.start();

    tokio::time::sleep(HOUR * 3 + Duration::from_secs(1)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 3);

    let jobs = scheduler.jobs();
    let tick = status_of(&jobs, "tick");
    assert_eq!(tick.runs, 3);
    assert_eq!(tick.failures, 0);
    assert!(tick.next_fire.is_some());
    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn test_failing_job_does_not_stop_others() {
    let healthy = Arc::new(AtomicUsize::new(0));
    let mut scheduler = Scheduler::new(vec![
        JobSpec::new("create-thread", hourly(), || async {
            Err(anyhow::anyhow!("content store unavailable"))
        }),
        counting_job("refresh-feed", healthy.clone()),
    ]);
    scheduler.start();

    tokio::time::sleep(HOUR * 3 + Duration::from_secs(1)).await;
    assert_eq!(healthy.load(Ordering::SeqCst), 3);

    let jobs = scheduler.jobs();
    let failing = status_of(&jobs, "create-thread");
    assert_eq!(failing.runs, 3);
    assert_eq!(failing.failures, 3);
    assert_eq!(failing.last_error.as_deref(), Some("content store unavailable"));
    assert_eq!(status_of(&jobs, "refresh-feed").failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_job_is_contained() {
    let healthy = Arc::new(AtomicUsize::new(0));
    let mut scheduler = Scheduler::new(vec![
        JobSpec::new("explodes", hourly(), || async { explode() }),
        counting_job("steady", healthy.clone()),
    ]);
    scheduler.start();

    tokio::time::sleep(HOUR * 2 + Duration::from_secs(1)).await;
    assert_eq!(healthy.load(Ordering::SeqCst), 2);

    let jobs = scheduler.jobs();
    let exploding = status_of(&jobs, "explodes");
    assert_eq!(exploding.runs, 2);
    assert_eq!(exploding.failures, 2);
    assert!(!exploding.is_running);
}

#[tokio::test(start_paused = true)]
async fn test_run_on_start_fires_immediately() {
    let fired = Arc::new(AtomicUsize::new(0));
    let spec = JobSpec::new("warmup", Cadence::every(HOUR * 24), {
        let fired = fired.clone();
        move || {
            let fired = fired.clone();
            async move {
                fired.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    })
    .run_on_start();
    let mut scheduler = Scheduler::new(vec![spec]);
    scheduler.start();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_job_never_overlaps_itself() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicUsize::new(0));

    let spec = JobSpec::new("slow", hourly(), {
        let (in_flight, peak, done) = (in_flight.clone(), peak.clone(), done.clone());
        move || {
            let (in_flight, peak, done) = (in_flight.clone(), peak.clone(), done.clone());
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(HOUR + HOUR / 2).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    });
    let mut scheduler = Scheduler::new(vec![spec]);
    scheduler.start();

    tokio::time::sleep(HOUR * 8).await;
    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert!(done.load(Ordering::SeqCst) >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_firing() {
    let fired = Arc::new(AtomicUsize::new(0));
    let mut scheduler = Scheduler::new(vec![counting_job("tick", fired.clone())]);
    scheduler.start();

    tokio::time::sleep(HOUR + Duration::from_secs(1)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    scheduler.stop();
    assert_eq!(scheduler.active_job_count(), 0);
    tokio::time::sleep(HOUR * 5).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // A second stop is harmless.
    scheduler.stop();
}

// ============================================================================
// Engine wiring
// ============================================================================

fn engine_with_feed(items: Vec<RawFeedItem>) -> Arc<ActionEngine> {
    let source: Arc<dyn FeedSource> = Arc::new(FixtureSource::new("fixture", items));
    let feed = Arc::new(FeedCache::new(source, FeedFilter::new(10), 100));
    Arc::new(ActionEngine::new(
        Collaborators::from_host(Arc::new(InMemoryHost::with_default_category())),
        feed,
        Arc::new(ThreadRandom),
        &MarionetteConfig::default(),
    ))
}

fn item() -> RawFeedItem {
    RawFeedItem {
        title: "t".into(),
        selftext: "long enough body text".into(),
        permalink: "https://example.invalid/p".into(),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_boot_stays_idle_unless_designated() {
    let engine = engine_with_feed(vec![item()]);
    let scheduler = boot(engine.clone(), &MarionetteConfig::default());

    assert!(!scheduler.is_started());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(engine.feed().generation(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_secondary_worker_does_not_run_jobs() {
    let engine = engine_with_feed(vec![item()]);
    let mut config = MarionetteConfig::default();
    config.engine.run_jobs = true;
    config.engine.is_primary = false;

    let scheduler = boot(engine, &config);
    assert!(!scheduler.is_started());
}

#[tokio::test(start_paused = true)]
async fn test_boot_registers_four_jobs_and_warms_feed() {
    let engine = engine_with_feed(vec![item()]);
    let mut config = MarionetteConfig::default();
    config.engine.run_jobs = true;

    let mut scheduler = boot(engine.clone(), &config);
    assert_eq!(scheduler.active_job_count(), 4);
    let mut names: Vec<String> = scheduler.jobs().into_iter().map(|j| j.name).collect();
    names.sort();
    assert_eq!(
        names,
        vec!["create-reply", "create-thread", "refresh-feed", "spawn-actor"]
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(engine.feed().len(), 1);
    assert!(engine.feed().generation() >= 1);
    scheduler.stop();
}
