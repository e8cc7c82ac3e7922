//! Jarvis server - serves the chat API and page over HTTP

use clap::Parser;
use jarvis::config::Config;
use jarvis::gateway::{router, AppState};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jarvis-server", version, about = "Jarvis chat agent server")]
struct Args {
    /// Bind address (overrides JARVIS_SERVER__HOST)
    #[arg(long)]
    bind: Option<String>,

    /// Port (overrides JARVIS_SERVER__PORT)
    #[arg(long, short)]
    port: Option<u16>,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.log.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    init_tracing(&config);

    if let Some(bind) = args.bind {
        config.server.host = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    info!("Starting {} v{}", jarvis::NAME, jarvis::VERSION);

    let state = AppState::from_config(&config);
    if state.is_available() {
        info!("Agent initialized: model={}", config.llm.model);
    } else {
        warn!("Serving without an agent; /api/chat will report unavailability");
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
