//! rooster-ingest - News ingestion microservice
//!
//! **Module Identity:**
//! - Name: rooster-ingest (Ingestion API)
//! - Port: 3002
//!
//! Pulls filings and news, scores them and optionally publishes relevant
//! items into the shared article store.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use clap::Parser;
use rooster_common::config::{self, resolve_setting, TomlConfig};
use rooster_common::events::EventBus;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rooster_ingest::settings::IngestSettings;
use rooster_ingest::sources::default_sources;
use rooster_ingest::AppState;

/// Command-line arguments for rooster-ingest
#[derive(Parser, Debug)]
#[command(name = "rooster-ingest")]
#[command(about = "News ingestion microservice for Rooster")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3002", env = "ROOSTER_INGEST_PORT")]
    port: u16,

    /// Root folder holding db.json
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(short, long, env = "ROOSTER_CONFIG")]
    config: Option<PathBuf>,
}

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

fn init_tracing(config_path: Option<&std::path::Path>) {
    let level = config_path
        .map(std::path::Path::to_path_buf)
        .or_else(config::default_config_path)
        .and_then(|path| config::read_toml_config(&path).ok())
        .map(|c| c.logging.level)
        .unwrap_or_else(|| config::CompiledDefaults::for_current_platform().log_level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=info", level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn cors_layer(toml: &TomlConfig) -> Result<CorsLayer> {
    let origin = resolve_setting("CORS_ORIGIN", toml.cors_origin.as_deref())
        .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("Invalid CORS origin: {}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]))
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        eprintln!("Loaded environment from {}", path.display());
    }

    let args = Args::parse();
    init_tracing(args.config.as_deref());

    info!("Starting rooster-ingest (Ingestion API) microservice");
    info!("Port: {}", args.port);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let toml = config::load_toml_config(args.config.as_deref());

    let root_folder = config::RootFolderResolver::new("rooster-ingest")
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&toml)
        .resolve();
    let initializer = config::RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    info!("Store: {}", initializer.store_path().display());

    let settings = IngestSettings::resolve(&toml);
    if settings.marketaux_api_token.is_none() {
        warn!("MARKETAUX_API_TOKEN not set, MarketAux is skipped");
    }
    if settings.newsapi_api_key.is_none() {
        warn!("NEWSAPI_API_KEY not set, NewsAPI is skipped");
    }
    info!(query = %settings.search_query(), watchlist = settings.watchlist.len(), "Ingestion settings resolved");

    let sources = default_sources(&settings).context("Failed to build HTTP client")?;
    let state = AppState::new(initializer.root_folder(), sources, settings, EventBus::new(100));

    let app = rooster_ingest::build_router(state).layer(cors_layer(&toml)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
