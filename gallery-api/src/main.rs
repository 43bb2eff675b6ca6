//! gallery-api: artwork and audio catalogue service
//!
//! Startup order: parse arguments, load the TOML config, initialize tracing,
//! resolve the root folder and image host credentials, open the database,
//! then serve until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use gallery_api::services::CloudinaryClient;
use gallery_api::{build_router, AppState};
use gallery_common::config::{
    CompiledDefaults, ImageHostConfig, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use gallery_common::db::init_database;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "gallery-api")]
#[command(about = "Artwork and audio catalogue service")]
#[command(version)]
struct Args {
    /// Address to listen on, e.g. 0.0.0.0:8000
    #[arg(short, long, env = "GALLERY_BIND")]
    bind: Option<String>,

    /// Port override applied to the bind address
    #[arg(short, long, env = "GALLERY_PORT")]
    port: Option<u16>,

    /// Root folder holding gallery.db (falls back to GALLERY_ROOT_FOLDER)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML config file (defaults to <config_dir>/gallery/config.toml)
    #[arg(short, long, env = "GALLERY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config =
        TomlConfig::load_or_default(args.config.as_deref()).context("Failed to load config")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&toml_config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting gallery-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new("gallery-api")
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&toml_config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let image_host_config = ImageHostConfig::resolve(&toml_config.image_host)
        .context("Image host is not configured")?;
    let image_host =
        CloudinaryClient::new(image_host_config).context("Failed to create image host client")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(pool, Arc::new(image_host));
    let app = build_router(state);

    let addr = bind_address(&args, &toml_config)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("gallery-api listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// CLI → TOML → compiled default, with `--port` applied last
fn bind_address(args: &Args, toml_config: &TomlConfig) -> Result<SocketAddr> {
    let raw = args
        .bind
        .clone()
        .or_else(|| toml_config.bind_address.clone())
        .unwrap_or_else(|| CompiledDefaults::for_current_platform().bind_address);

    let mut addr: SocketAddr = raw
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", raw))?;
    if let Some(port) = args.port {
        addr.set_port(port);
    }
    Ok(addr)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
