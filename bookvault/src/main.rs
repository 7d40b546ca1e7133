//! BookVault - personal book-tracking backend
//!
//! Startup order: arguments, configuration, logging, database (with
//! migrations), services, HTTP server.

use anyhow::{Context, Result};
use bookvault::services::{BookStore, CatalogClient, CoverCache};
use bookvault::{build_router, AppState};
use bookvault_common::config::{default_config_path, ConfigOverrides};
use bookvault_common::db::init_database;
use bookvault_common::Config;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "bookvault")]
#[command(about = "Personal book-tracking backend")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "BOOKVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "BOOKVAULT_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "BOOKVAULT_DATABASE")]
    database: Option<PathBuf>,

    /// Directory for cached cover images
    #[arg(long, env = "BOOKVAULT_COVER_CACHE")]
    cover_cache: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            database_path: self.database.clone(),
            cover_cache_dir: self.cover_cache.clone(),
            host: self.host.clone(),
            port: self.port,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Loaded before tracing exists so the log level can come from the file
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config_found = config_path.exists();
    let loaded = Config::load(&config_path);

    let log_level = args
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|c| c.logging.level.clone()))
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=info", log_level).into()),
        )
        .init();

    info!(
        "Starting BookVault v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = loaded
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?
        .with_overrides(args.overrides());
    config.validate().context("Invalid configuration")?;

    if config_found {
        info!("Configuration: {}", config_path.display());
    } else {
        warn!("Config file {} not found, using defaults", config_path.display());
    }

    info!("Database path: {}", config.database_path.display());
    let pool = match init_database(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let catalog = Arc::new(
        CatalogClient::new(&config.catalog).context("Failed to create catalog client")?,
    );
    let covers = Arc::new(
        CoverCache::new(&config.cover_cache_dir).context("Failed to create cover cache")?,
    );
    info!("Cover cache: {}", config.cover_cache_dir.display());

    let store = BookStore::new(pool, Some(Arc::clone(&catalog)), covers);
    let state = AppState::new(store, catalog, config.cover_cache_dir.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("BookVault listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
