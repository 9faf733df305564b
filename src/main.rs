//! Movie Relay - Main Server
//!
//! Proxies movie CRUD to the upstream store and pushes every accepted change
//! to connected WebSocket clients.

use anyhow::Result;
use clap::{Parser, Subcommand};
use movie_relay::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "movie-relay")]
#[command(about = "Movie catalog relay with live change notifications")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve {
        /// Port to listen on (overrides config.yaml and SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to a YAML config file (defaults to ./config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,movie_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let mut config = Config::from_yaml_and_env(config.as_deref())?;
            if let Some(port) = port {
                config.server_port = port;
            }
            movie_relay::start_server(config).await
        }
    }
}
