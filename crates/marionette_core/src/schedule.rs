//! Structured recurrence for scheduled jobs.
//!
//! A cadence is an interval plus an optional time-of-day anchor. Anchored
//! cadences fire on the grid `anchor + k * interval` (UTC), so "every 6 hours
//! from midnight" fires at 00:00, 06:00, 12:00 and 18:00.

use anyhow::{bail, Result};
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest accepted interval: one (leap) year.
pub const MAX_EVERY_SECS: u64 = 366 * 24 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cadence {
    /// Interval between firings in seconds, in `1..=MAX_EVERY_SECS`
    pub every_secs: u64,
    /// Optional UTC time-of-day the grid is aligned to
    #[serde(default)]
    pub anchor: Option<NaiveTime>,
}

impl Cadence {
    /// Fire every `interval`, counted from whenever the job starts.
    pub fn every(interval: Duration) -> Self {
        Self {
            every_secs: interval.as_secs().max(1),
            anchor: None,
        }
    }

    /// Fire every `hours`, aligned to midnight UTC.
    pub fn every_hours(hours: u64) -> Self {
        Self {
            every_secs: hours * 3600,
            anchor: NaiveTime::from_hms_opt(0, 0, 0),
        }
    }

    /// Fire once a day at `hour:minute` UTC.
    pub fn daily_at(hour: u32, minute: u32) -> Self {
        Self {
            every_secs: 24 * 3600,
            anchor: NaiveTime::from_hms_opt(hour, minute, 0),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.every_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.every_secs == 0 {
            bail!("cadence interval must be greater than zero");
        }
        if self.every_secs > MAX_EVERY_SECS {
            bail!(
                "cadence interval of {}s exceeds the maximum of {}s",
                self.every_secs,
                MAX_EVERY_SECS
            );
        }
        Ok(())
    }

    /// First firing instant strictly after `t`.
    ///
    /// Intervals outside the valid range are clamped into it, and the result
    /// saturates at the latest representable instant.
    pub fn next_after(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let step = TimeDelta::seconds(self.every_secs.clamp(1, MAX_EVERY_SECS) as i64);
        let next = match self.anchor {
            None => t.checked_add_signed(step),
            Some(anchor) => {
                let base = t.date_naive().and_time(anchor).and_utc();
                let step_ms = step.num_milliseconds();
                let elapsed_ms = (t - base).num_milliseconds();
                let k = elapsed_ms.div_euclid(step_ms) + 1;
                base.checked_add_signed(TimeDelta::milliseconds(k * step_ms))
            }
        };
        next.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// How long to wait from `now` until the next firing.
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        (self.next_after(now) - now).to_std().unwrap_or_default()
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.anchor {
            Some(anchor) => write!(f, "every {}s from {}", self.every_secs, anchor.format("%H:%M")),
            None => write!(f, "every {}s", self.every_secs),
        }
    }
}
