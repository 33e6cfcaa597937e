//! Wiring of engine actions onto scheduler jobs.

use crate::actions::ActionEngine;
use crate::scheduler::{JobSpec, Scheduler};
use anyhow::Context;
use marionette_core::config::JobsConfig;
use marionette_core::MarionetteConfig;
use std::sync::Arc;

pub const SPAWN_ACTOR: &str = "spawn-actor";
pub const CREATE_THREAD: &str = "create-thread";
pub const CREATE_REPLY: &str = "create-reply";
pub const REFRESH_FEED: &str = "refresh-feed";

/// The four recurring engine jobs. The feed refresh also fires once at start.
pub fn engine_jobs(engine: Arc<ActionEngine>, jobs: &JobsConfig) -> Vec<JobSpec> {
    let spawn = engine.clone();
    let thread = engine.clone();
    let reply = engine.clone();
    let refresh = engine;

    vec![
        JobSpec::new(SPAWN_ACTOR, jobs.spawn_actor, move || {
            let engine = spawn.clone();
            async move {
                engine.create_ai_user().await.context("Failed to spawn actor")?;
                Ok(())
            }
        }),
        JobSpec::new(CREATE_THREAD, jobs.create_thread, move || {
            let engine = thread.clone();
            async move {
                engine.create_thread().await.context("Failed to create thread")?;
                Ok(())
            }
        }),
        JobSpec::new(CREATE_REPLY, jobs.create_reply, move || {
            let engine = reply.clone();
            async move {
                engine.create_reply().await.context("Failed to create reply")?;
                Ok(())
            }
        }),
        JobSpec::new(REFRESH_FEED, jobs.refresh_feed, move || {
            let engine = refresh.clone();
            async move {
                engine.refresh_feed().await.context("Failed to refresh feed")?;
                Ok(())
            }
        })
        .run_on_start(),
    ]
}

/// Build the job scheduler and start it when this process is allowed to run jobs.
///
/// The returned scheduler is idle unless `enabled`, `run_jobs` and
/// `is_primary` are all set.
pub fn boot(engine: Arc<ActionEngine>, config: &MarionetteConfig) -> Scheduler {
    let mut scheduler = Scheduler::new(engine_jobs(engine, &config.jobs));
    if config.should_run_jobs() {
        tracing::info!("Starting scheduled jobs");
        scheduler.start();
    } else {
        tracing::info!(
            enabled = config.engine.enabled,
            run_jobs = config.engine.run_jobs,
            is_primary = config.engine.is_primary,
            "Scheduled jobs disabled for this process"
        );
    }
    scheduler
}
