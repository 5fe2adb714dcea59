//! hilite - highlight finder command line
//!
//! Submits a video to the engine, waits for every highlight source to
//! report, and prints the merged marker timeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hilite_common::config::{default_config_path, write_toml_config, ConfigResolver, TomlConfig};
use hilite_common::events::HighlightEvent;
use hilite_common::time_codec::{parse_timestamp, seconds_to_timestamp};
use hilite_engine::services::{
    CommentSource, HttpBackendClient, JsonCommentSource, StaticCommentSource,
};
use hilite_engine::{EngineError, EngineServices, HighlightEngine};

const DEFAULT_LOG_FILTER: &str = "hilite_engine=info,hilite_common=info";

/// Command-line arguments for hilite
#[derive(Parser, Debug)]
#[command(name = "hilite")]
#[command(about = "Find highlight moments in a video from comments, heatmap and audio")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Analysis service base URL
    #[arg(long, global = true)]
    analysis_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect highlights for a video and print the marker timeline
    Analyze {
        /// Video URL or id
        url: String,

        /// JSON file of `[{"text": ..., "likeCount": ...}]` comments
        #[arg(long)]
        comments: Option<PathBuf>,

        /// Ignore cached analysis results
        #[arg(long)]
        force_fresh: bool,
    },

    /// Drop cached analysis results for a video
    ClearCache {
        url: String,
    },

    /// Write a default config file
    InitConfig {
        /// Destination (defaults to the platform config directory)
        path: Option<PathBuf>,
    },

    /// Convert between seconds and `M:SS` / `H:MM:SS`
    Timestamp {
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(args.config.clone(), args.analysis_url.clone());
    let (config, origin) = resolver.resolve();
    init_tracing(&config)?;
    origin.log();

    match args.command {
        Command::Analyze {
            url,
            comments,
            force_fresh,
        } => analyze(&resolver, &config, &url, comments, force_fresh).await,
        Command::ClearCache { url } => clear_cache(&resolver, &config, &url).await,
        Command::InitConfig { path } => init_config(path),
        Command::Timestamp { value } => timestamp(&value),
    }
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match config.logging.level.as_str() {
            "info" => DEFAULT_LOG_FILTER.into(),
            level => format!("hilite_engine={0},hilite_common={0}", level).into(),
        }
    });

    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = config
        .logging
        .file
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}

fn backend(resolver: &ConfigResolver, config: &TomlConfig) -> Result<Arc<HttpBackendClient>> {
    let base_url = resolver.analysis_base_url(config);
    info!(base_url = %base_url, "Analysis service");
    let client = HttpBackendClient::new(base_url, config.engine.request_timeout())
        .context("Failed to create analysis client")?;
    Ok(Arc::new(client))
}

async fn analyze(
    resolver: &ConfigResolver,
    config: &TomlConfig,
    url: &str,
    comments: Option<PathBuf>,
    force_fresh: bool,
) -> Result<()> {
    let backend = backend(resolver, config)?;
    let comment_source: Arc<dyn CommentSource> = match comments {
        Some(path) => Arc::new(JsonCommentSource::new(path)),
        None => Arc::new(StaticCommentSource::empty()),
    };

    let services = EngineServices::new(comment_source, backend.clone(), backend);
    let engine = HighlightEngine::new(&config.engine, services);

    let mut events = engine.event_bus().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                HighlightEvent::JobProgress {
                    attempt,
                    max_attempts,
                    message,
                    ..
                } => info!(
                    attempt,
                    max_attempts,
                    message = message.as_deref().unwrap_or(""),
                    "Analysis running"
                ),
                HighlightEvent::SourceFailed {
                    source_name,
                    message,
                    ..
                } => warn!(source = %source_name, error = %message, "Highlight source unavailable"),
                _ => {}
            }
        }
    });

    engine
        .submit_with(url, force_fresh)
        .await
        .with_context(|| format!("Cannot analyze '{}'", url))?;

    tokio::select! {
        _ = engine.settle() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping");
            engine.shutdown().await;
            return Ok(());
        }
    }

    let snapshot = engine.snapshot().await;
    if snapshot.markers.is_empty() {
        println!("No highlights found");
    }
    for marker in &snapshot.markers {
        println!(
            "{:>8}  {:<16}  {:<5}  {}",
            marker.timestamp(),
            marker.source_type,
            marker.color.as_token(),
            marker.label.as_deref().unwrap_or("")
        );
    }

    if let Some(error) = engine.job_error().await {
        eprintln!("audio analysis: {}", error);
    }
    for failure in &snapshot.failures {
        eprintln!("{}", EngineError::from(failure));
    }
    Ok(())
}

async fn clear_cache(resolver: &ConfigResolver, config: &TomlConfig, url: &str) -> Result<()> {
    let backend = backend(resolver, config)?;
    let services = EngineServices::new(
        Arc::new(StaticCommentSource::empty()),
        backend.clone(),
        backend,
    );
    let engine = HighlightEngine::new(&config.engine, services);
    let message = engine
        .clear_cache(url)
        .await
        .context("Failed to clear cache")?;
    println!("{}", message);
    Ok(())
}

fn init_config(path: Option<PathBuf>) -> Result<()> {
    let Some(path) = path.or_else(default_config_path) else {
        bail!("No platform config directory; pass a path");
    };
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    let config = TomlConfig {
        analysis_base_url: Some(hilite_common::config::DEFAULT_ANALYSIS_BASE_URL.to_string()),
        ..TomlConfig::default()
    };
    write_toml_config(&config, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn timestamp(value: &str) -> Result<()> {
    if value.contains(':') {
        let seconds = parse_timestamp(value).with_context(|| format!("Invalid timestamp '{}'", value))?;
        println!("{}", seconds);
    } else {
        let seconds: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid seconds '{}'", value))?;
        println!("{}", seconds_to_timestamp(seconds));
    }
    Ok(())
}
