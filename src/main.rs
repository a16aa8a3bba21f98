//! Chat Hub Server
//!
//! Run with: cargo run --bin chathub
//!
//! # Configuration
//!
//! Settings come from the file given with `--config`, otherwise from the
//! default locations (`~/.config/chathub/config.toml`, `./chathub.toml`).
//! Environment variables override the file:
//! - `CHATHUB_HOST`, `CHATHUB_PORT`: Listen address (default: 127.0.0.1:5003)
//! - `CHATHUB_ID_PREFIX`: Peer id prefix (default: ChatUser)
//! - `CHATHUB_LOG_LEVEL`, `CHATHUB_LOG_FORMAT`: Logging (default: info, pretty)
//! - `RUST_LOG`: Overrides the log level entirely

use chathub::api::{serve, AppState};
use chathub::config::{Config, LoggingConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "chathub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Broadcast chat hub server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_logging(&config.logging);

    tracing::info!("Starting chat hub server v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        tracing::info!("Config file: {:?}", path);
    }

    let api_config = config.api_config();
    let state = AppState::with_parts(api_config.clone(), config.hub_config(), config.demo_config());

    tracing::info!(
        id_prefix = %config.hub.id_prefix,
        "Serving on {}",
        api_config.addr()
    );
    serve(state, &api_config).await?;

    tracing::info!("Chat hub server stopped");
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // A bare level applies to this crate and the HTTP layer only
        if logging.level.contains('=') || logging.level.contains(',') {
            EnvFilter::new(&logging.level)
        } else {
            EnvFilter::new(format!(
                "chathub={level},tower_http={level}",
                level = logging.level
            ))
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
