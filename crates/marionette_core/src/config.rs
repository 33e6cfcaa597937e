use crate::schedule::Cadence;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarionetteConfig {
    pub engine: EngineSwitches,
    pub jobs: JobsConfig,
    pub feed: FeedConfig,
    pub identity: IdentityConfig,
    pub content: ContentConfig,
}

impl MarionetteConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: MarionetteConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, cadence) in self.jobs.entries() {
            cadence
                .validate()
                .with_context(|| format!("invalid cadence for job '{}'", name))?;
        }
        if self.feed.limit == 0 {
            anyhow::bail!("feed.limit must be greater than zero");
        }
        if self.content.reply_window_days == 0 {
            anyhow::bail!("content.reply_window_days must be greater than zero");
        }
        Ok(())
    }

    /// Whether this process should run the scheduled jobs at all.
    pub fn should_run_jobs(&self) -> bool {
        self.engine.enabled && self.engine.run_jobs && self.engine.is_primary
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_bool("MARIONETTE_RUN_JOBS") {
            self.engine.run_jobs = v;
        }
        if let Some(v) = env_bool("MARIONETTE_ENABLED") {
            self.engine.enabled = v;
        }
        if let Ok(v) = std::env::var("MARIONETTE_FEED_URL") {
            self.feed.site_url = v;
        }
        if let Ok(v) = std::env::var("MARIONETTE_SUBREDDIT") {
            self.feed.subreddit = v;
        }
        if let Ok(v) = std::env::var("MARIONETTE_FEED_LIMIT") {
            if let Ok(n) = v.parse() {
                self.feed.limit = n;
            }
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let v = std::env::var(key).ok()?;
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSwitches {
    /// Master switch for synthetic actors.
    pub enabled: bool,
    /// Designates this process as the single writer that runs jobs.
    pub run_jobs: bool,
    /// False on secondary workers of a clustered host.
    pub is_primary: bool,
}

impl Default for EngineSwitches {
    fn default() -> Self {
        Self {
            enabled: true,
            run_jobs: false,
            is_primary: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub spawn_actor: Cadence,
    pub create_thread: Cadence,
    pub create_reply: Cadence,
    pub refresh_feed: Cadence,
}

impl JobsConfig {
    pub fn entries(&self) -> [(&'static str, Cadence); 4] {
        [
            ("spawn-actor", self.spawn_actor),
            ("create-thread", self.create_thread),
            ("create-reply", self.create_reply),
            ("refresh-feed", self.refresh_feed),
        ]
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            spawn_actor: Cadence::daily_at(3, 0),
            create_thread: Cadence::every_hours(6),
            create_reply: Cadence::every_hours(2),
            refresh_feed: Cadence::daily_at(2, 0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub site_url: String,
    pub subreddit: String,
    pub limit: usize,
    /// Minimum body length (characters) for an item to be cached.
    pub min_body_chars: usize,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            site_url: "https://www.reddit.com".to_string(),
            subreddit: "regretfulparents".to_string(),
            limit: 100,
            min_body_chars: 100,
            user_agent: concat!("marionette/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub pool_name: String,
    pub pool_description: String,
    pub pool_hidden: bool,
    pub username_prefix: String,
    pub email_domain: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            pool_name: "ai-users".to_string(),
            pool_description: "AI-generated users for simulation purposes".to_string(),
            pool_hidden: true,
            username_prefix: "parent_".to_string(),
            email_domain: "ai-user.invalid".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub thread_tags: Vec<String>,
    pub reply_window_days: u32,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            thread_tags: vec!["regret".to_string(), "parenting".to_string()],
            reply_window_days: 7,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
