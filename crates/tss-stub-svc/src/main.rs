//! Development Signing Backend Service

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tss_stub_svc::{router, AppState};

/// Stub signing backend CLI arguments
#[derive(Parser, Debug)]
#[command(name = "tss-stub-svc")]
#[command(about = "Single-process signing backend for local development")]
#[command(version)]
struct Args {
    /// Listen address
    #[arg(short, long, env = "TSS_STUB_LISTEN", default_value = "0.0.0.0:50051")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!(listen = %args.listen, "Starting stub signing backend");

    let app = router(Arc::new(AppState::default()));

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!(address = %args.listen, "Listening");

    axum::serve(listener, app).await?;

    Ok(())
}
