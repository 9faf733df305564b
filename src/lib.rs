//! Movie Relay
//!
//! A CRUD proxy for a movie catalog with:
//! - REST forwarding to an upstream movie store
//! - WebSocket fan-out of every accepted change to all connected clients
//! - A client-side reducer that keeps each viewer's list convergent

pub mod api;
pub mod client;
pub mod events;
pub mod gateway;
pub mod movies;
pub mod upstream;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub upstream: UpstreamYamlConfig,
    pub events: EventsYamlConfig,
    pub gateway: GatewayYamlConfig,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self { port: 3001 }
    }
}

/// Upstream store section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamYamlConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for UpstreamYamlConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".into(),
            timeout_secs: 10,
        }
    }
}

/// Push channel section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsYamlConfig {
    pub ping_interval_secs: u64,
    pub subscriber_buffer: usize,
}

impl Default for EventsYamlConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: 30,
            subscriber_buffer: 1024,
        }
    }
}

/// Mutation gateway section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayYamlConfig {
    /// Run one mutation (upstream call + broadcast) at a time
    pub serialize_mutations: bool,
}

impl Default for GatewayYamlConfig {
    fn default() -> Self {
        Self {
            serialize_mutations: true,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub upstream_url: String,
    pub upstream_timeout: Duration,
    pub ping_interval: Duration,
    pub subscriber_buffer: usize,
    pub serialize_mutations: bool,
}

impl Config {
    /// Load configuration from environment variables and `config.yaml` in CWD.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let upstream_timeout_secs = env_parse("UPSTREAM_TIMEOUT_SECS")?
            .unwrap_or(yaml.upstream.timeout_secs);
        let ping_interval_secs =
            env_parse("WS_PING_INTERVAL_SECS")?.unwrap_or(yaml.events.ping_interval_secs);

        Ok(Self {
            server_port: env_parse("SERVER_PORT")?.unwrap_or(yaml.server.port),
            upstream_url: std::env::var("UPSTREAM_URL").unwrap_or(yaml.upstream.url),
            upstream_timeout: Duration::from_secs(upstream_timeout_secs.max(1)),
            // tokio intervals reject a zero period
            ping_interval: Duration::from_secs(ping_interval_secs.max(1)),
            subscriber_buffer: env_parse("SUBSCRIBER_BUFFER")?
                .unwrap_or(yaml.events.subscriber_buffer)
                .max(1),
            serialize_mutations: yaml.gateway.serialize_mutations,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = PathBuf::from("config.yaml");
        let path = yaml_path.unwrap_or(&default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Read an env var and parse it; unset means `None`, unparsable is an error.
fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: {:?}", name, raw)),
        Err(_) => Ok(None),
    }
}

// ============================================================================
// Server
// ============================================================================

/// Wire the upstream client, registry, broadcaster and gateway together
pub fn build_state(config: &Config) -> Result<api::RelayState> {
    let store = Arc::new(upstream::UpstreamClient::new(
        &config.upstream_url,
        config.upstream_timeout,
    )?);
    Ok(state_with_store(store, config))
}

/// Build server state around any store implementation
pub fn state_with_store(store: Arc<dyn upstream::MovieStore>, config: &Config) -> api::RelayState {
    let registry = Arc::new(events::SubscriberRegistry::new());
    let broadcaster = Arc::new(events::ChangeBroadcaster::new(registry.clone()));
    let gateway = Arc::new(gateway::MutationGateway::new(
        store,
        broadcaster,
        config.serialize_mutations,
    ));

    Arc::new(api::ServerState {
        gateway,
        registry,
        ping_interval: config.ping_interval,
        subscriber_buffer: config.subscriber_buffer,
    })
}

/// Serve the relay on an already-bound listener until `shutdown` fires
pub async fn serve(
    listener: TcpListener,
    state: api::RelayState,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = api::create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Server error")
}

/// Bind the configured port and serve until Ctrl-C
pub async fn start_server(config: Config) -> Result<()> {
    let state = build_state(&config)?;

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(
        upstream = %config.upstream_url,
        "Movie relay listening on http://{}",
        addr
    );

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
        }
        trigger.cancel();
    });

    serve(listener, state, shutdown).await
}

// ============================================================================
// Tests
// ============================================================================
