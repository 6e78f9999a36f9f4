//! Cerberus Sentinel API Server
//!
//! Ensemble threat-scoring REST API for blockchain transactions
//!
//! Usage:
//!   cargo run --bin sentinel_api
//!
//! Environment:
//!   PORT / SENTINEL_PORT - Server port (default: 5001)
//!   SENTINEL_HOST        - Server host (default: 0.0.0.0)
//!   MODEL_PATH           - Anomaly model artifact (default: model.json)
//!   RUST_LOG             - Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cerberus_sentinel::api::handlers::AppState;
use cerberus_sentinel::api::routes::create_router;
use cerberus_sentinel::core::SentinelEngine;
use cerberus_sentinel::models::{SentinelConfig, ServerConfig};
use cerberus_sentinel::storage::MemoryReportStore;
use cerberus_sentinel::utils::constants::{APP_NAME, APP_VERSION, MODEL_VERSION};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let server_cfg = ServerConfig::default();

    // Anomaly model is optional: without it the anomaly detector runs
    // purely statistical
    let model = SentinelEngine::load_model(&server_cfg.model_path);
    if model.is_some() {
        info!("✅ Anomaly model loaded from {}", server_cfg.model_path);
    }

    let store = Arc::new(MemoryReportStore::new());
    let engine = Arc::new(SentinelEngine::new(
        SentinelConfig::default(),
        model,
        store,
    )?);

    let state = Arc::new(AppState::new(engine));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", server_cfg.host, server_cfg.port).parse()?;

    info!("🚀 {} {} starting on http://{}", APP_NAME, APP_VERSION, addr);
    info!("   Model version: {}", MODEL_VERSION);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/predict    - Score one transaction");
    info!("  GET  /v1/analytics  - Rolling threat analytics");
    info!("  GET  /v1/health     - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");
    info!("");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("");
    info!("👋 {} shutdown complete", APP_NAME);

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ================================================================
        C E R B E R U S   S E N T I N E L   v{}
        Ensemble Threat Scoring Engine
    ================================================================
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
