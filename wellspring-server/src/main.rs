use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};
use wellspring_core::WellspringConfig;

use wellspring_server::http::{self, AppState};
use wellspring_server::subsystems::sweeper;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "wellspring.toml")]
    config: String,

    /// Print the resolved configuration (API key excluded) and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match WellspringConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging: RUST_LOG wins, otherwise the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    if args.check_config {
        println!("{:#?}", config);
        let key = if config.upstream.api_key().is_some() { "set" } else { "missing" };
        println!("Upstream API key ({}): {}", config.upstream.api_key_env, key);
        return Ok(());
    }

    let state = match AppState::from_config(config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Failed to initialise server state: {}", e);
            std::process::exit(1);
        }
    };

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    // Idle session sweep runs at a quarter of the TTL, at least once a minute
    let ttl_minutes = state.config.sessions.idle_ttl_minutes;
    if ttl_minutes > 0 {
        let interval = tokio::time::Duration::from_secs((ttl_minutes * 15).clamp(1, 60));
        tokio::spawn(sweeper::run_session_sweeper(
            state.sessions.clone(),
            interval,
            tx.subscribe(),
        ));
    }

    http::start_http_server(state, tx.subscribe()).await?;

    Ok(())
}
