// src/main.rs
//
// Command-line front door

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use media_harvester::db::get_connection;
use media_harvester::{
    create_connection_pool, initialize_database, AssetMaterializer, AssetStorage,
    ExtractionRequest, ExtractionService, HarvesterConfig, ResourceRepository,
    SqliteResourceRepository, YtDlpDownloader, YtDlpExtractor,
};

#[derive(Parser)]
#[command(name = "media-harvester")]
#[command(author, version, about = "Extract and store metadata, video and subtitles for a URL")]
struct Cli {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract metadata for a URL and store it
    Extract {
        url: String,

        /// Also download the video
        #[arg(long)]
        video: bool,

        /// Also download every available subtitle language
        #[arg(long)]
        subtitles: bool,
    },

    /// Show a stored record
    Get { id: Uuid },

    /// Show offered and downloaded subtitles of a stored record
    Subtitles { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HarvesterConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let config = HarvesterConfig::default();
            config.validate()?;
            config
        }
    };

    let service = build_service(&config)?;

    match cli.command {
        Commands::Extract {
            url,
            video,
            subtitles,
        } => {
            let request = ExtractionRequest::metadata_only(url)
                .with_video(video)
                .with_subtitles(subtitles);

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("interrupt received, cancelling");
                    on_signal.cancel();
                }
            });

            let record = service.extract(&request, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Get { id } => {
            let record = service.get_by_id(id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Subtitles { id } => {
            let summary = service.get_subtitles(id).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn build_service(config: &HarvesterConfig) -> Result<ExtractionService> {
    // 1. INFRASTRUCTURE
    let pool = Arc::new(create_connection_pool(&config.database_path, config.pool_size)?);
    {
        let conn = get_connection(&pool)?;
        initialize_database(&conn)?;
    }
    let storage = AssetStorage::new(&config.storage_root, &config.platform);

    // 2. REPOSITORIES
    let repository: Arc<dyn ResourceRepository> = Arc::new(SqliteResourceRepository::new(pool));

    // 3. CAPABILITIES
    let extractor = Arc::new(YtDlpExtractor::new(config.tool.clone()));
    let downloader = Arc::new(YtDlpDownloader::new(config.tool.clone()));
    let materializer = Arc::new(AssetMaterializer::new(
        downloader,
        storage,
        config.subtitle_concurrency,
    ));

    // 4. SERVICES
    Ok(ExtractionService::new(
        extractor,
        materializer,
        repository,
        config.duplicate_policy,
    ))
}
