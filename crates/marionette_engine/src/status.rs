//! Point-in-time engine status for operators.

use crate::actions::ActionEngine;
use crate::scheduler::Scheduler;
use marionette_core::EngineError;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub actor_pool_size: usize,
    pub feed_cache_size: usize,
    pub feed_generation: u64,
    pub active_job_count: usize,
}

pub struct StatusReporter {
    engine: Arc<ActionEngine>,
}

impl StatusReporter {
    pub fn new(engine: Arc<ActionEngine>) -> Self {
        Self { engine }
    }

    /// Read-only snapshot. Pass `None` when no scheduler is running in this process.
    pub async fn report(&self, scheduler: Option<&Scheduler>) -> Result<EngineStatus, EngineError> {
        let feed = self.engine.feed().snapshot();
        Ok(EngineStatus {
            actor_pool_size: self.engine.directory().pool_size().await?,
            feed_cache_size: feed.items.len(),
            feed_generation: feed.generation,
            active_job_count: scheduler.map_or(0, Scheduler::active_job_count),
        })
    }
}
