//! API Twin Server - CLI Entry Point

use anyhow::Result;
use api_twins::{load_fixtures, router, AppState, DispatchEngine};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "api-twins",
    about = "API twin server - replays recorded fixture stories as canned HTTP responses",
    version
)]
struct Args {
    /// Root directory of fixture stories
    #[arg(short, long, default_value = "./api_twins")]
    fixtures: PathBuf,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Directory of static files served when no fixture matches
    #[arg(short, long)]
    public: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Load and check the fixture set, then exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load fixtures before binding anything. A broken fixture set is a
    // startup failure, never a partially served one.
    info!(path = %args.fixtures.display(), "Loading fixtures");
    let fixtures = match load_fixtures(&args.fixtures).await {
        Ok(fixtures) => fixtures,
        Err(err) => {
            error!(error = %err, "Fixture loading failed");
            std::process::exit(1);
        }
    };

    if args.validate {
        println!("Fixture set is valid ({} fixtures loaded)", fixtures.len());
        return Ok(());
    }

    info!(fixtures = fixtures.len(), "Fixture set loaded");

    let state = Arc::new(AppState {
        engine: DispatchEngine::new(fixtures),
        public_dir: args.public,
    });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!(addr = %args.listen, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to install shutdown signal handler");
    }
}
