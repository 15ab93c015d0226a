//! Pocketbank API Server
//!
//! Main entry point for the Pocketbank money-movement service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pocketbank_api::{AppState, HttpCredentialVerifier, create_router};
use pocketbank_core::notification::LoggingSink;
use pocketbank_core::{CoreDeps, CoreServices, SystemClock};
use pocketbank_db::{SeaStore, connect};
use pocketbank_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pocketbank=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect(&config.database).await.context("failed to connect to database")?;
    info!("Connected to database");

    let credentials =
        HttpCredentialVerifier::new(&config.auth).context("failed to build auth service client")?;
    let services = CoreServices::new(
        CoreDeps {
            repos: Arc::new(SeaStore::new(db)),
            credentials: Arc::new(credentials),
            sink: Arc::new(LoggingSink),
            clock: Arc::new(SystemClock),
        },
        &config.ledger,
        &config.scheduler,
    )
    .context("invalid ledger configuration")?;

    // Scheduled transfer worker, stopped through the same signal as the server
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = if config.scheduler.enabled {
        let runner = Arc::clone(&services.runner);
        let poll_interval = config.scheduler.poll_interval();
        Some(tokio::spawn(async move {
            runner.run(poll_interval, shutdown_rx).await;
        }))
    } else {
        warn!("Scheduled transfer worker disabled");
        None
    };

    let state = AppState {
        services,
        jwt: Arc::new(JwtService::new(JwtConfig {
            secret: config.jwt.secret.clone(),
            ..JwtConfig::default()
        })),
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    let _ = shutdown_tx.send(true);
    if let Some(worker) = worker {
        worker.await.context("scheduler task panicked")?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
