//! Cadence-driven job runner.
//!
//! Each registered job gets its own background loop. A loop sleeps until the
//! next cadence point, runs the job body in a child task and waits for it
//! before scheduling the next fire, so a job never overlaps itself. Errors
//! and panics stay inside the job that raised them.

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt};
use marionette_core::Cadence;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub type JobAction = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A named job and the cadence it fires on.
#[derive(Clone)]
pub struct JobSpec {
    pub name: String,
    pub cadence: Cadence,
    /// Fire once as soon as the scheduler starts, then follow the cadence.
    pub run_on_start: bool,
    action: JobAction,
}

impl JobSpec {
    pub fn new<F, Fut>(name: impl Into<String>, cadence: Cadence, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            cadence,
            run_on_start: false,
            action: Arc::new(move || action().boxed()),
        }
    }

    pub fn run_on_start(mut self) -> Self {
        self.run_on_start = true;
        self
    }
}

/// Point-in-time bookkeeping for one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub name: String,
    pub cadence: String,
    pub is_running: bool,
    pub runs: u64,
    pub failures: u64,
    pub last_error: Option<String>,
    pub next_fire: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct JobState {
    is_running: AtomicBool,
    runs: AtomicU64,
    failures: AtomicU64,
    last_error: Mutex<Option<String>>,
    next_fire: Mutex<Option<DateTime<Utc>>>,
}

impl JobState {
    fn set_last_error(&self, value: Option<String>) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }

    fn set_next_fire(&self, value: Option<DateTime<Utc>>) {
        *self.next_fire.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }
}

struct RunningJob {
    spec: JobSpec,
    state: Arc<JobState>,
    handle: JoinHandle<()>,
}

/// Sleep cap for cadence points too far out to represent as an instant.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Pairs a wall-clock reading with the tokio instant it was taken at.
///
/// Sleeping is done on tokio's clock, so cadence points are mapped onto it
/// through this pair. A fresh pair is taken before every sleep, so a clock
/// step or host suspend only skews the one sleep that spans it.
#[derive(Clone, Copy)]
struct JobClock {
    wall: DateTime<Utc>,
    mono: Instant,
}

impl JobClock {
    fn now() -> Self {
        Self {
            wall: Utc::now(),
            mono: Instant::now(),
        }
    }

    fn instant_at(&self, t: DateTime<Utc>) -> Instant {
        let wait = (t - self.wall).to_std().unwrap_or_default();
        self.mono + wait.min(FAR_FUTURE)
    }
}

#[derive(Default)]
pub struct Scheduler {
    specs: Vec<JobSpec>,
    running: Vec<RunningJob>,
}

impl Scheduler {
    pub fn new(specs: Vec<JobSpec>) -> Self {
        Self {
            specs,
            running: Vec::new(),
        }
    }

    pub fn is_started(&self) -> bool {
        !self.running.is_empty()
    }

    /// Spawn one loop per registered job. Must be called inside a tokio runtime.
    /// Calling it while already started does nothing.
    pub fn start(&mut self) {
        if self.is_started() {
            tracing::warn!("Scheduler already started");
            return;
        }

        for spec in &self.specs {
            let state = Arc::new(JobState::default());
            let handle = tokio::spawn(job_loop(spec.clone(), state.clone()));
            tracing::info!(job = %spec.name, cadence = %spec.cadence, "Scheduled job");
            self.running.push(RunningJob {
                spec: spec.clone(),
                state,
                handle,
            });
        }
    }

    /// Cancel every job loop. A body already in flight finishes on its own.
    /// Calling it again, or before `start`, does nothing.
    pub fn stop(&mut self) {
        if self.running.is_empty() {
            return;
        }
        for job in self.running.drain(..) {
            job.handle.abort();
        }
        tracing::info!("Scheduler stopped");
    }

    pub fn active_job_count(&self) -> usize {
        self.running.len()
    }

    pub fn jobs(&self) -> Vec<JobStatus> {
        self.running
            .iter()
            .map(|job| JobStatus {
                name: job.spec.name.clone(),
                cadence: job.spec.cadence.to_string(),
                is_running: job.state.is_running.load(Ordering::SeqCst),
                runs: job.state.runs.load(Ordering::SeqCst),
                failures: job.state.failures.load(Ordering::SeqCst),
                last_error: job
                    .state
                    .last_error
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .clone(),
                next_fire: *job
                    .state
                    .next_fire
                    .lock()
                    .unwrap_or_else(|e| e.into_inner()),
            })
            .collect()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn job_loop(spec: JobSpec, state: Arc<JobState>) {
    if spec.run_on_start {
        run_once(&spec, &state).await;
    }

    loop {
        let clock = JobClock::now();
        let next = spec.cadence.next_after(clock.wall);
        state.set_next_fire(Some(next));
        tokio::time::sleep_until(clock.instant_at(next)).await;
        run_once(&spec, &state).await;
    }
}

async fn run_once(spec: &JobSpec, state: &JobState) {
    state.is_running.store(true, Ordering::SeqCst);
    state.set_next_fire(None);
    tracing::debug!(job = %spec.name, "Job firing");

    let result = tokio::spawn((spec.action)()).await;
    state.runs.fetch_add(1, Ordering::SeqCst);

    match result {
        Ok(Ok(())) => state.set_last_error(None),
        Ok(Err(e)) => {
            tracing::error!(job = %spec.name, "Job failed: {:#}", e);
            state.failures.fetch_add(1, Ordering::SeqCst);
            state.set_last_error(Some(format!("{:#}", e)));
        }
        Err(join_err) => {
            tracing::error!(job = %spec.name, "Job aborted: {}", join_err);
            state.failures.fetch_add(1, Ordering::SeqCst);
            state.set_last_error(Some(join_err.to_string()));
        }
    }

    state.is_running.store(false, Ordering::SeqCst);
}
