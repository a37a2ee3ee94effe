// src/main.rs
//
// animestele command line: wires the store, adapters and services
// together and runs one command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use animestele::config::Config;
use animestele::db::{create_connection_pool, get_connection, initialize_database};
use animestele::domain::PublicationTarget;
use animestele::events::{register_progress_handlers, EventBus};
use animestele::integrations::{AnimeFireClient, JikanClient, ScanPolicy, TelegramClient};
use animestele::logging::init_logger;
use animestele::ports::SourceCatalogReader;
use animestele::repositories::{EntityStore, Repository};
use animestele::services::{
    Destination, DestinationRegistry, IngestionCoordinator, IngestionReport, Pipeline,
    PublicationSummary, PublicationTracker, PublishOptions, RetryPolicy,
};

#[derive(Debug, Parser)]
#[command(
    name = "animestele",
    version,
    about = "Anime release ingestion and channel publication"
)]
struct Cli {
    /// SQLite database file (overrides ANIMESTELE_DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the schema and register the configured channel
    Init,
    /// Collect recent releases and ingest them
    Ingest {
        #[arg(long)]
        start_page: Option<u32>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Ingest one anime from its catalog page
    IngestUrl { url: String },
    /// Publish everything not yet sent to the configured channel
    Publish,
    /// Ingest, then publish what is new
    Run {
        #[arg(long)]
        start_page: Option<u32>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the most recently stored rows, or one anime in detail
    Show {
        #[arg(long, default_value_t = 10)]
        animes: usize,
        #[arg(long, default_value_t = 10)]
        episodes: usize,
        /// Show every episode and publication of this source id instead
        #[arg(long)]
        source: Option<i64>,
    },
    /// Print database statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(path) = cli.database {
        config.database_path = path;
    }

    let store = open_store(&config)?;
    let event_bus = Arc::new(EventBus::new());
    let progress = register_progress_handlers(&event_bus);

    match cli.command {
        Command::Init => {
            let destination = register_destination(&config, &store)?;
            println!(
                "Database ready at {}; publishing to {} {}",
                config.database_path.display(),
                destination.platform,
                destination.chat
            );
        }
        Command::Ingest { start_page, limit } => {
            let pipeline = build_pipeline(&config, &store, &event_bus, false)?;
            let report = pipeline
                .ingest_releases(
                    start_page.unwrap_or(config.start_page),
                    limit.unwrap_or(config.extract_limit),
                )
                .await?;
            print_ingestion(&report);
        }
        Command::IngestUrl { url } => {
            let pipeline = build_pipeline(&config, &store, &event_bus, false)?;
            let report = pipeline.ingest_url(&url).await?;
            print_ingestion(&report);
        }
        Command::Publish => {
            let destination = register_destination(&config, &store)?;
            let pipeline = build_pipeline(&config, &store, &event_bus, true)?;
            let summary = pipeline.publish_pending(&destination).await?;
            print_publication("Pending", &summary);
        }
        Command::Run { start_page, limit } => {
            let destination = register_destination(&config, &store)?;
            let pipeline = build_pipeline(&config, &store, &event_bus, true)?;
            let report = pipeline
                .run(
                    start_page.unwrap_or(config.start_page),
                    limit.unwrap_or(config.extract_limit),
                    &destination,
                )
                .await?;
            print_ingestion(&report.ingestion);
            print_publication("Animes", &report.animes);
            print_publication("Episodes", &report.episodes);
        }
        Command::Show {
            source: Some(source_id),
            ..
        } => show_source(&store, source_id)?,
        Command::Show { animes, episodes, .. } => {
            for anime in store.animes.list_recent(animes)? {
                println!(
                    "anime   {:>6}  {:<40}  {}",
                    anime.source_id, anime.title, anime.added_to
                );
            }
            for episode in store.episodes.list_recent(episodes)? {
                println!(
                    "episode {:>6}  #{:<4} {:<60}  {}",
                    episode.source_id,
                    episode.episode_number,
                    episode.watch_link,
                    episode.added_to
                );
            }
        }
        Command::Stats => {
            store.verify_integrity()?;
            let stats = store.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    if progress.batches() > 0 || progress.animes_published() + progress.episodes_published() > 0 {
        println!("Done: {}", progress);
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<EntityStore> {
    let pool = create_connection_pool(&config.database_path)
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    {
        let conn = get_connection(&pool)?;
        initialize_database(&conn)?;
    }
    Ok(EntityStore::sqlite(Arc::new(pool)))
}

fn show_source(store: &EntityStore, source_id: i64) -> Result<()> {
    let anime = store
        .animes
        .find_by_natural_key(&source_id)?
        .and_then(|id| store.animes.get(id).transpose())
        .transpose()?
        .with_context(|| format!("no anime with source id {}", source_id))?;

    println!("{} '{}' ({})", anime.source_id, anime.title, anime.added_to);
    if let Some(id) = anime.id {
        print_records(store, PublicationTarget::Anime(id))?;
    }

    for episode in store.episodes.list_by_source(source_id)? {
        println!(
            "  #{:<4} {}  hd={}  sd={}",
            episode.episode_number,
            episode.watch_link,
            episode.download_link_hd.as_deref().unwrap_or("-"),
            episode.download_link_sd.as_deref().unwrap_or("-")
        );
        if let Some(id) = episode.id {
            print_records(store, PublicationTarget::Episode(id))?;
        }
    }
    Ok(())
}

fn print_records(store: &EntityStore, target: PublicationTarget) -> Result<()> {
    for record in store.publications.list_for_target(target)? {
        println!(
            "        sent to channel {} as message {} at {}",
            record.channel_id,
            record.external_message_id,
            record.created_at.to_rfc3339()
        );
    }
    Ok(())
}

fn register_destination(config: &Config, store: &EntityStore) -> Result<Destination> {
    let registry = DestinationRegistry::new(store.clone());
    let (platform, channel) = registry.ensure(&config.platform, &config.channel)?;
    let chat = channel
        .chat_ref()
        .context("registered channel has neither chat id nor chat name")?;
    Ok(Destination {
        platform: platform.name,
        chat,
    })
}

fn build_pipeline(
    config: &Config,
    store: &EntityStore,
    event_bus: &Arc<EventBus>,
    publish: bool,
) -> Result<Pipeline> {
    let catalog: Arc<dyn SourceCatalogReader> = Arc::new(
        AnimeFireClient::new(config.catalog_url.clone(), config.http_timeout)?
            .with_download_host(config.download_host.clone())
            .with_dubbed(config.include_dubbed)
            .with_scan_policy(ScanPolicy {
                max_ordinal: config.max_episode_scan,
                ..ScanPolicy::default()
            }),
    );
    let resolver = Arc::new(JikanClient::new(
        config.metadata_url.clone(),
        config.http_timeout,
    )?);

    let coordinator = IngestionCoordinator::new(
        Arc::clone(&catalog),
        resolver,
        store.clone(),
        Arc::clone(event_bus),
    );
    let pipeline = Pipeline::new(catalog, coordinator);
    if !publish {
        return Ok(pipeline);
    }

    let publisher = Arc::new(TelegramClient::new(
        config.require_telegram_token()?,
        config.http_timeout,
    )?);
    let tracker = PublicationTracker::new(
        store.clone(),
        publisher,
        Arc::clone(event_bus),
        RetryPolicy::new(2, config.publish_retry_delay),
        PublishOptions::default(),
    );
    Ok(pipeline.with_publication(tracker))
}

fn print_ingestion(report: &IngestionReport) {
    println!(
        "Ingestion: {} new animes, {} new episodes, {} unresolved, {} failures",
        report.new_animes.len(),
        report.new_episodes.len(),
        report.unresolved.len(),
        report.failures.len()
    );
    for title in &report.unresolved {
        println!("  unresolved: {}", title);
    }
    for failure in &report.failures {
        println!("  failed: {}: {}", failure.subject, failure.error);
    }
}

fn print_publication(label: &str, summary: &PublicationSummary) {
    println!(
        "{}: {} published, {} already published, {} failures",
        label,
        summary.published.len(),
        summary.already_published,
        summary.failures.len()
    );
    for failure in &summary.failures {
        println!("  failed: {}: {}", failure.subject, failure.error);
    }
}
