use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use konekt_server::{EngineStats, Matchmaker, SignalingService, ws_handler};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "konekt-server", about = "Matchmaking and signaling relay")]
struct Args {
    /// Address to bind the HTTP/websocket listener to.
    #[arg(long, default_value = "0.0.0.0:3001")]
    bind: SocketAddr,

    /// Tracing filter; takes precedence over RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = match &args.log {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (match_cmd_tx, match_cmd_rx) = mpsc::channel(256);
    let signaling = SignalingService::new(match_cmd_tx.clone());

    let matchmaker = Matchmaker::new(match_cmd_rx, Arc::new(signaling.clone()));
    tokio::spawn(matchmaker.run());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/stats", get(stats))
        .route("/ws", get(ws_handler))
        .with_state(signaling);

    info!("signaling server listening on http://{}", args.bind);
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn stats(State(service): State<SignalingService>) -> Json<EngineStats> {
    let stats = service.stats().await.unwrap_or(EngineStats {
        total_users: 0,
        waiting_users: 0,
        active_rooms: 0,
    });
    Json(stats)
}
