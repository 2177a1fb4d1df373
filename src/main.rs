//! Comic-Ingest main entry point
//!
//! This is the command-line interface for the Comic-Ingest catalog crawler.

use anyhow::{bail, Context};
use clap::Parser;
use comic_ingest::catalog::{open_catalog, CatalogStore};
use comic_ingest::config::{load_config_with_hash, Config};
use comic_ingest::crawler::build_registry;
use comic_ingest::output::{load_statistics, print_session_summary, print_statistics};
use comic_ingest::progress::{BroadcastChannel, ProgressMessage};
use comic_ingest::source::HttpSourceClient;
use comic_ingest::{CrawlRequest, CrawlSession, CrawlStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing_subscriber::EnvFilter;

/// Comic-Ingest: an incremental comic catalog crawler
///
/// Comic-Ingest walks a range of listing pages of a comic source, creates comics that are
/// new to the catalog and adds the chapters (with their image lists) published since the
/// last run.
#[derive(Parser, Debug)]
#[command(name = "comic-ingest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental comic catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// First listing page to crawl
    #[arg(long, default_value_t = 1)]
    start_page: u32,

    /// Last listing page to crawl (defaults to the start page)
    #[arg(long)]
    end_page: Option<u32>,

    /// Mirror ingested items to secondary storage
    #[arg(long)]
    save_to_secondary_storage: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the catalog and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    fn request(&self) -> CrawlRequest {
        CrawlRequest {
            start_page: self.start_page,
            end_page: self.end_page.unwrap_or(self.start_page),
            save_to_secondary_storage: self.save_to_secondary_storage,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let request = cli.request();
    if let Err(e) = request.validate() {
        bail!("invalid page range: {}", e);
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &request);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        let session = handle_crawl(config, request).await?;
        if session.status == CrawlStatus::Error {
            bail!("crawl session {} ended with an error", session.session_id);
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("comic_ingest=info,warn"),
            1 => EnvFilter::new("comic_ingest=debug,info"),
            2 => EnvFilter::new("comic_ingest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, request: &CrawlRequest) {
    println!("=== Comic-Ingest Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);
    println!("  Listing: {}", config.source.list_path);
    println!("  Detail: {}", config.source.detail_path);
    println!("  Image CDN: {}", config.source.image_cdn_url);
    println!("  User agent: {}", config.source.user_agent);
    println!("  Timeout: {}s", config.source.request_timeout_secs);

    println!("\nPacing:");
    println!("  Request delay: {}ms", config.pacing.request_delay_ms);
    println!(
        "  Batch pause: {}ms every {} items/chapters",
        config.pacing.batch_delay_ms, config.pacing.batch_size
    );

    println!("\nWorkers:");
    println!(
        "  Max concurrent sessions: {}",
        config.workers.max_concurrent_sessions
    );
    println!("  Queue capacity: {}", config.workers.queue_capacity);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl listing pages {}..={} ({} pages)",
        request.start_page,
        request.end_page,
        request.page_range().len()
    );
}

/// Handles the --stats mode: shows statistics from the catalog
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let catalog = open_catalog(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&catalog)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
///
/// The first Ctrl-C asks the session to stop at its next checkpoint; a second one shuts
/// the registry down.
async fn handle_crawl(config: Config, request: CrawlRequest) -> anyhow::Result<CrawlSession> {
    let catalog: Arc<dyn CatalogStore> =
        Arc::new(open_catalog(Path::new(&config.output.database_path))?);
    let source = Arc::new(HttpSourceClient::new(&config.source)?);
    let channel = BroadcastChannel::new(config.progress.channel_capacity);
    let mut progress = channel.subscribe();

    let registry = build_registry(&config, source, catalog, Arc::new(channel));
    let started = registry.start(request)?;
    tracing::info!("{}", started.message);

    let mut interrupts = 0u32;
    let session = loop {
        tokio::select! {
            snapshot = next_snapshot(&mut progress, &started.session_id) => {
                let Some(session) = snapshot else {
                    bail!("progress channel closed before session {} finished", started.session_id);
                };
                log_snapshot(&session);
                if session.status.is_terminal() {
                    break session;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                interrupts += 1;
                if interrupts == 1 {
                    tracing::warn!("Interrupt received, stopping after the current step (Ctrl-C again to abort)");
                    if let Err(e) = registry.stop(&started.session_id) {
                        tracing::debug!("Stop not delivered: {}", e);
                    }
                } else {
                    tracing::warn!("Second interrupt received, shutting down");
                    registry.shutdown();
                }
            }
        }
    };

    print_session_summary(&session);
    Ok(session)
}

/// Next snapshot for `session_id`, skipping lag and other sessions' traffic
async fn next_snapshot(
    progress: &mut Receiver<ProgressMessage>,
    session_id: &str,
) -> Option<CrawlSession> {
    loop {
        match progress.recv().await {
            Ok(message) if message.session.session_id == session_id => {
                return Some(message.session)
            }
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("Progress subscriber lagged, {} snapshots skipped", skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

fn log_snapshot(session: &CrawlSession) {
    match &session.current_item_slug {
        Some(slug) => tracing::debug!(
            "[{}] page {}/{} item {} ({} chapters), {} processed, {} errors",
            session.status,
            session.current_page,
            session.requested_page_range.end_page,
            slug,
            session.current_item_chapters_processed,
            session.total_items_processed,
            session.errors.len()
        ),
        None => tracing::debug!("[{}] page {}", session.status, session.current_page),
    }
    if let Some(chapter) = &session.last_completed_chapter {
        tracing::trace!(
            "Last chapter: {} #{} ({} images)",
            chapter.comic_name,
            chapter.chapter_number,
            chapter.image_count
        );
    }
}
