//! Obwira back-office HTTP server.

use anyhow::Context;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use obwira_postgres::PostgresRecordStore;
use obwira_server::auth::SessionRegistry;
use obwira_server::blob::FsBlobStore;
use obwira_server::config::Config;
use obwira_server::featured::FeaturedManager;
use obwira_server::notifications::{
    spawn_feed_subscription, FeedEnvironment, FeedReducer, FeedState, FeedStore,
};
use obwira_server::server::{build_router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "obwira_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Obwira back-office server");

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    let config = Config::from_env()?;
    info!(
        bind_addr = %config.server.bind_addr,
        upload_root = %config.storage.root.display(),
        "Configuration loaded"
    );

    info!("Connecting to Postgres...");
    let records: Arc<dyn obwira_core::record_store::RecordStore> = Arc::new(
        PostgresRecordStore::connect(&config.postgres.url, config.postgres.max_connections)
            .await
            .context("failed to connect to Postgres")?,
    );
    info!("Record store connected");

    let blobs = Arc::new(FsBlobStore::new(
        config.storage.root.clone(),
        config.storage.public_base.clone(),
    ));
    let sessions = Arc::new(SessionRegistry::new(config.auth.session_ttl));
    let featured = Arc::new(FeaturedManager::new(records.clone()));

    let feed: FeedStore = FeedStore::new(
        FeedState::default(),
        FeedReducer,
        FeedEnvironment {
            records: records.clone(),
        },
    );
    let subscription = spawn_feed_subscription(records.clone(), feed.clone());
    info!("Notification feed subscription started");

    let state = AppState::new(records, blobs, sessions, feed.clone(), featured);
    let app = build_router(state).route(
        "/metrics",
        get(move || {
            let prometheus = prometheus.clone();
            async move { prometheus.render() }
        }),
    );

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .context("failed to bind listener")?;
    info!(address = %config.server.bind_addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Draining notification feed...");
    subscription.abort();
    if let Err(e) = feed.shutdown(Duration::from_secs(5)).await {
        error!(error = %e, "feed shutdown did not drain cleanly");
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
