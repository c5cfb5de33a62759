//! Server bootstrap
//!
//! Environment loading and the run_server entry point.

use crate::config::Config;
use crate::server::server::HttpServer;
use crate::utils::error::Result;
use tracing::info;

/// Run the gateway with configuration taken from the process environment.
pub async fn run_server() -> Result<()> {
    // Load .env if present; real environment variables win.
    dotenvy::dotenv().ok();

    info!("🚀 Starting fal gateway");

    let config = Config::from_env()?;

    info!(
        "🌐 Server starting at: http://{}:{} ({:?} mode)",
        config.host, config.port, config.environment
    );
    info!("📋 API Endpoints:");
    info!("   GET  /health - Health check");
    info!("   POST /api/generate - Queued image generation");
    info!("   POST /api/edit - Prompt-guided image editing");
    info!("   POST /api/workflow - Streamed workflow run");
    info!("   POST /api/upload - Image upload to provider storage");
    info!("   POST /api/describe - Vision prompt for a person and an object");
    info!("   POST /api/compose - Vision prompt from a merged frame");

    let server = HttpServer::new(config)?;
    server.start().await
}
