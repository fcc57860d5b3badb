//! rooster-dash - Dashboard microservice
//!
//! **Module Identity:**
//! - Name: rooster-dash (Dashboard API)
//! - Port: 3001
//!
//! Serves articles, tags, subscriptions, drafts and the review queue to the
//! curator UI, and pushes changes over SSE.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use clap::Parser;
use rooster_common::config::{self, resolve_setting, TomlConfig};
use rooster_common::events::EventBus;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rooster_dash::notify::{DisabledNotifier, Notifier};
use rooster_dash::services::{JoinCombiner, OpenAiCombiner, SlackClient, SmtpNotifier, TextCombiner};
use rooster_dash::AppState;

/// Command-line arguments for rooster-dash
#[derive(Parser, Debug)]
#[command(name = "rooster-dash")]
#[command(about = "Dashboard API microservice for Rooster")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3001", env = "ROOSTER_DASH_PORT")]
    port: u16,

    /// Root folder holding db.json and approved.json
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

fn build_combiner(toml: &TomlConfig) -> Result<Arc<dyn TextCombiner>> {
    match resolve_setting("OPENAI_API_KEY", toml.openai.api_key.as_deref()) {
        Some(api_key) => {
            info!(model = %toml.openai.model, "AI text combination enabled");
            let combiner = OpenAiCombiner::new(
                api_key,
                &toml.openai.base_url,
                &toml.openai.model,
                toml.openai.temperature,
            )
            .context("Failed to build OpenAI client")?;
            Ok(Arc::new(combiner))
        }
        None => {
            warn!("OPENAI_API_KEY not set, drafts are joined without AI combination");
            Ok(Arc::new(JoinCombiner))
        }
    }
}

fn build_notifier(toml: &TomlConfig) -> Result<Arc<dyn Notifier>> {
    let sender = resolve_setting("EMAIL_SENDER", toml.email.sender.as_deref());
    let password = resolve_setting("EMAIL_PASSWORD", toml.email.password.as_deref());

    match (sender, password) {
        (Some(sender), Some(password)) => {
            info!(sender = %sender, host = %toml.email.smtp_host, "Alert email enabled");
            let notifier = SmtpNotifier::new(
                &toml.email.smtp_host,
                &sender,
                &password,
                &toml.email.sender_name,
            )
            .context("Failed to build SMTP transport")?;
            Ok(Arc::new(notifier))
        }
        _ => {
            warn!("EMAIL_SENDER/EMAIL_PASSWORD not set, subscription alerts are disabled");
            Ok(Arc::new(DisabledNotifier))
        }
    }
}

fn build_slack(toml: &TomlConfig) -> Result<Arc<SlackClient>> {
    let mut client = SlackClient::new(
        resolve_setting("SLACK_WEBHOOK_URL", toml.slack.webhook_url.as_deref()),
        resolve_setting("SLACK_BOT_TOKEN", toml.slack.bot_token.as_deref()),
        resolve_setting("SLACK_USER_ID", toml.slack.user_id.as_deref()),
    )
    .context("Failed to build Slack client")?;
    if let Some(api_base) = resolve_setting("SLACK_API_BASE", toml.slack.api_base.as_deref()) {
        client = client.with_api_base(api_base);
    }

    if !client.webhook_configured() {
        warn!("SLACK_WEBHOOK_URL not set, /api/reviews/send is unavailable");
    }
    if !client.dm_configured() {
        warn!("SLACK_BOT_TOKEN not set, /api/reviews/sendToMe is unavailable");
    }
    Ok(Arc::new(client))
}

fn cors_layer(toml: &TomlConfig) -> Result<CorsLayer> {
    let origin = resolve_setting("CORS_ORIGIN", toml.cors_origin.as_deref())
        .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("Invalid CORS origin: {}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]))
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        eprintln!("Loaded environment from {}", path.display());
    }

    let args = Args::parse();
    init_tracing(args.config.as_deref());

    info!("Starting rooster-dash (Dashboard API) microservice");
    info!("Port: {}", args.port);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let toml = config::load_toml_config(args.config.as_deref());

    // Root folder: CLI → env → TOML → OS default
    let root_folder = config::RootFolderResolver::new("rooster-dash")
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&toml)
        .resolve();
    let initializer = config::RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    info!("Store: {}", initializer.store_path().display());
    info!("Approved log: {}", initializer.approved_path().display());

    let event_bus = EventBus::new(100);
    let state = AppState::new(
        initializer.root_folder(),
        build_combiner(&toml)?,
        build_notifier(&toml)?,
        build_slack(&toml)?,
        event_bus,
    );

    let app = rooster_dash::build_router(state).layer(cors_layer(&toml)?);

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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
