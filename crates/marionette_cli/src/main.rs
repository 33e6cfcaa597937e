use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use marionette_core::{
    ActionOutcome, Archetype, FeedSource, MarionetteConfig, RawFeedItem, ThreadRandom,
};
use marionette_engine::{boot, ActionEngine, Collaborators, InMemoryHost, StatusReporter};
use marionette_perception::{FeedCache, FeedFilter, FixtureSource, RedditHotSource};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, global = true, env = "MARIONETTE_CONFIG", default_value = "marionette.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Serve seed content from a built-in fixture instead of the network
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the scheduled jobs and run until interrupted
    Run,
    /// Run one action immediately
    Act {
        #[arg(value_enum)]
        action: Action,
        /// Number of times to run it
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Print engine status as JSON
    Status {
        /// Refresh the feed cache before reporting
        #[arg(long)]
        refresh: bool,
    },
    /// List the persona catalog
    Personas,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Action {
    SpawnActor,
    CreateThread,
    CreateReply,
    RefreshFeed,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_json);

    if let Command::Personas = args.command {
        print_personas();
        return Ok(());
    }

    let config = MarionetteConfig::load_or_default(&args.config);
    let host = Arc::new(InMemoryHost::with_default_category());
    let engine = Arc::new(build_engine(&config, host, args.offline)?);

    match args.command {
        Command::Run => run(engine, &config).await,
        Command::Act { action, repeat } => act(&engine, action, repeat).await,
        Command::Status { refresh } => {
            if refresh {
                engine.refresh_feed().await?;
            }
            let status = StatusReporter::new(engine).report(None).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Command::Personas => Ok(()),
    }
}

fn build_engine(
    config: &MarionetteConfig,
    host: Arc<InMemoryHost>,
    offline: bool,
) -> anyhow::Result<ActionEngine> {
    let source: Arc<dyn FeedSource> = if offline {
        Arc::new(FixtureSource::new("offline", offline_stories()))
    } else {
        Arc::new(RedditHotSource::new(&config.feed).context("Failed to set up feed source")?)
    };
    info!(source = source.name(), "Using feed source");

    let feed = Arc::new(FeedCache::new(
        source,
        FeedFilter::new(config.feed.min_body_chars),
        config.feed.limit,
    ));
    Ok(ActionEngine::new(
        Collaborators::from_host(host),
        feed,
        Arc::new(ThreadRandom),
        config,
    ))
}

async fn run(engine: Arc<ActionEngine>, config: &MarionetteConfig) -> anyhow::Result<()> {
    let mut scheduler = boot(engine.clone(), config);
    if !scheduler.is_started() {
        warn!("Nothing to run: set engine.run_jobs = true (or MARIONETTE_RUN_JOBS=1) to start jobs");
        return Ok(());
    }

    info!("Marionette running. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    for job in scheduler.jobs() {
        info!(
            job = %job.name,
            runs = job.runs,
            failures = job.failures,
            last_error = job.last_error.as_deref().unwrap_or("-"),
            "Job summary"
        );
    }
    let status = StatusReporter::new(engine).report(Some(&scheduler)).await?;
    scheduler.stop();
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

async fn act(engine: &ActionEngine, action: Action, repeat: u32) -> anyhow::Result<()> {
    for _ in 0..repeat {
        let line = match action {
            Action::SpawnActor => {
                let id = engine.create_ai_user().await?;
                format!("spawned actor {}", id)
            }
            Action::CreateThread => match engine.create_thread().await? {
                ActionOutcome::Done(t) => format!(
                    "thread {} by actor {} in category {}: {}",
                    t.thread_id, t.actor_id, t.category_id, t.title
                ),
                ActionOutcome::Skipped(reason) => format!("skipped: {}", reason),
            },
            Action::CreateReply => match engine.create_reply().await? {
                ActionOutcome::Done(r) => format!(
                    "reply {} by actor {} in thread {}",
                    r.post_id, r.actor_id, r.thread_id
                ),
                ActionOutcome::Skipped(reason) => format!("skipped: {}", reason),
            },
            Action::RefreshFeed => {
                let kept = engine.refresh_feed().await?;
                format!("feed refreshed: {} items kept", kept)
            }
        };
        println!("{}", line);
    }
    Ok(())
}

fn print_personas() {
    for archetype in Archetype::ALL {
        let p = archetype.persona();
        println!("{}", archetype);
        println!("  {}", p.description);
        println!("  traits: {}", p.traits.join(", "));
        println!("  replies: {} base, {} topic-specific", p.base_replies.len(), p.bonus_replies.len());
    }
}

fn offline_stories() -> Vec<RawFeedItem> {
    [
        (
            "I miss who I was before",
            "Three kids in and I barely recognize myself. I used to paint, travel, stay up late talking about ideas. Now every day is the same loop of school runs and laundry.",
        ),
        (
            "Nobody warned me about the exhaustion",
            "I have not slept more than four hours in a row in two years. My partner works nights and I am alone with the baby. I love her but I am so tired I can barely think.",
        ),
        (
            "We can't afford this life",
            "Daycare costs more than my salary. I quit my job to stay home and now the money stress is constant. Every purchase is a fight and I feel trapped in a life I did not plan.",
        ),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (title, body))| RawFeedItem {
        title: title.to_string(),
        selftext: body.to_string(),
        permalink: format!("offline://story/{}", i),
        score: 100 - i as i64,
        ..Default::default()
    })
    .collect()
}
