use anyhow::{Context, Result};
use clap::Parser;
use interview_proctor::{create_router, AppState, Config, NatsClient};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "interview-proctor", version, about = "Proctored interview session service")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/interview-proctor")]
    config: String,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let bind = args.bind.unwrap_or_else(|| cfg.service.http.bind.clone());
    let port = args.port.unwrap_or(cfg.service.http.port);

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Policy: {} violations, {}s absence threshold, {} default questions",
        cfg.proctoring.max_violations,
        cfg.proctoring.absence_threshold_secs,
        cfg.interview.questions.len()
    );

    let mut state =
        AppState::new(cfg.session_defaults()).with_retention(cfg.service.retention.policy());

    if cfg.nats.enabled {
        match NatsClient::connect(&cfg.nats.url).await {
            Ok(client) => state = state.with_nats(client),
            Err(e) => warn!("NATS unavailable, serving HTTP only: {:#}", e),
        }
    }

    let sweeper = state.clone();
    let sweep_interval = cfg.service.retention.sweep_interval();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(sweep_interval);
        loop {
            tick.tick().await;
            sweeper.prune_ended().await;
        }
    });

    let app = create_router(state);
    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
