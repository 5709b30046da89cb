//! kashif-ir - Incident Reporting service
//!
//! HTTP service for reporting road and vehicle damage incidents: loads the
//! pretrained damage-classification model, scores evidence images, walks the
//! submission wizard, and persists finalized reports.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kashif_common::events::EventBus;
use kashif_ir::analysis::AnalysisTimeline;
use kashif_ir::classify::ClassificationPipeline;
use kashif_ir::db::{self, reports::ReportStore};
use kashif_ir::model::{HttpModelProvider, ModelGateway};
use kashif_ir::wizard::Wizard;
use kashif_ir::AppState;

/// Command-line arguments for kashif-ir
#[derive(Parser, Debug)]
#[command(name = "kashif-ir")]
#[command(about = "Incident reporting service with AI damage classification")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "KASHIF_PORT")]
    port: Option<u16>,

    /// Path to the TOML configuration file
    #[arg(short, long, env = "KASHIF_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(short, long, env = "KASHIF_DATABASE")]
    database: Option<PathBuf>,

    /// Base URL of the classification model (overrides the config file)
    #[arg(short, long, env = "KASHIF_MODEL_URL")]
    model_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(kashif_common::config::default_config_path);
    let config = kashif_common::config::load_toml_config(&config_path)
        .context("Failed to load configuration")?;

    // Initialize tracing; the env var wins over the config file
    let default_filter = config
        .log_filter
        .clone()
        .unwrap_or_else(|| "kashif_ir=debug,tower_http=debug".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = args.port.unwrap_or(config.port);
    let model_url = args.model_url.unwrap_or_else(|| config.model_url.clone());
    let db_path = args.database.unwrap_or_else(|| config.database_path());

    info!("Starting kashif-ir (Incident Reporting) on port {}", port);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Model: {}", model_url);
    info!("Database: {}", db_path.display());

    let db_pool = db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let event_bus = EventBus::new(100); // 100 event capacity

    let provider = HttpModelProvider::new(&model_url);
    let gateway = Arc::new(ModelGateway::new(Box::new(provider), event_bus.clone()));
    let pipeline = Arc::new(ClassificationPipeline::new(
        Arc::clone(&gateway),
        event_bus.clone(),
    ));

    let store = ReportStore::new(db_pool);
    let timeline = AnalysisTimeline::new(AnalysisTimeline::default_findings(), event_bus.clone());
    let wizard = Arc::new(Wizard::new(timeline, store.clone(), event_bus.clone()));

    // Warm the model in the background; the wizard stays usable and a
    // failed load can be retried via POST /model/load.
    tokio::spawn({
        let gateway = Arc::clone(&gateway);
        async move {
            if let Err(e) = gateway.load().await {
                warn!("Initial model load failed: {}", e);
            }
        }
    });

    let state = AppState::new(event_bus, gateway, pipeline, wizard, store);
    let app = kashif_ir::build_router(state);

    let bind: std::net::IpAddr = config
        .bind_address
        .parse()
        .context("Invalid bind address")?;
    let addr = SocketAddr::new(bind, port);

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
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
