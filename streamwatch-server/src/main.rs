//! Streamwatch Server
//!
//! Watches YouTube channels for upcoming and live broadcasts and announces
//! them to the Telegram chats subscribed to each channel.

mod api;
mod config;
mod engine;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use engine::{Engine, EngineParts, Mode};
use server::{build_router, run_server};
use shutdown::{shutdown_signal, spawn_config_reload_handler};
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use streamwatch_core::config::ConfigStore;
use streamwatch_core::coordination::RedisLockService;
use streamwatch_core::events::stream_candidate_channel;
use streamwatch_core::framework::DatabaseProcessor;
use streamwatch_core::messaging::TelegramMessenger;
use streamwatch_core::processors::HttpHubSubscriber;
use streamwatch_core::sources::YoutubeSource;
use streamwatch_core::store::PgStore;
use streamwatch_sdk::client::{HubClient, TelegramClient, YoutubeClient};
use streamwatch_sdk::objects::websub::callback_url;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Streamwatch - YouTube broadcast announcements for Telegram chats
#[derive(Parser, Debug)]
#[command(name = "streamwatch-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./streamwatch.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, env = "STREAMWATCH_DEBUG", default_value = "false")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    tracing::info!("Starting streamwatch-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(loaded_config.engine.store_timeout)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    let engine_config = ConfigStore::new(loaded_config.engine.clone());
    let request_timeout = loaded_config.engine.request_timeout;

    // External services
    let locks = Arc::new(
        RedisLockService::connect(&loaded_config.redis_url, request_timeout)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to Redis: {}", e);
                e
            })?,
    );
    let http = reqwest::Client::builder().timeout(request_timeout).build()?;
    let youtube = YoutubeClient::new(loaded_config.youtube_api_key.as_str())?
        .with_http_client(http.clone());
    let mut telegram = TelegramClient::new(loaded_config.telegram.bot_token.as_str())?
        .with_http_client(http.clone());
    if let Some(base) = loaded_config.telegram.api_base.clone() {
        telegram = telegram.with_base_url(base);
    }
    let hub = HubClient::new()?.with_http_client(http);

    let store = Arc::new(PgStore::new(
        DatabaseProcessor {
            pool: db_pool.clone(),
        },
        loaded_config.engine.store_timeout,
    ));
    let source = Arc::new(YoutubeSource::new(youtube, request_timeout));

    let mode = match loaded_config.server.public_host.as_deref() {
        Some(host) => Mode::Push {
            callback: callback_url(host),
        },
        None => Mode::Poll,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (stream_tx, stream_rx) = stream_candidate_channel();
    let state = AppState::new(store.clone(), source.clone(), stream_tx.clone());

    let engine = Engine::spawn(
        EngineParts {
            subscriptions: store.clone(),
            completions: store,
            source,
            locks: locks.clone(),
            messenger: Arc::new(TelegramMessenger::new(telegram, request_timeout)),
            hub: Arc::new(HttpHubSubscriber::new(hub, request_timeout)),
            config: engine_config.clone(),
        },
        &mode,
        stream_tx,
        stream_rx,
        shutdown_rx,
    )
    .await;

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify = spawn_config_reload_handler(config_loader, engine_config);

    let router = build_router(state, mode.is_push());

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let shutdown_tx = Arc::new(shutdown_tx);
    let signal_tx = shutdown_tx.clone();
    let result = run_server(router, listen_addr, async move {
        shutdown_signal().await;
        let _ = signal_tx.send(true);
    })
    .await;
    if let Err(e) = &result {
        tracing::error!("HTTP server failed: {}", e);
    }

    // The engine stops on the same signal, also when the server failed to bind.
    let _ = shutdown_tx.send(true);
    engine.join().await;
    reload_notify.notify_one();

    tracing::info!("Closing connections...");
    if let Err(e) = locks.quit().await {
        tracing::warn!("Failed to close Redis connection: {}", e);
    }
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "debug,sqlx=warn,fred=info,hyper=info"
    } else {
        "info,sqlx=warn,fred=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
