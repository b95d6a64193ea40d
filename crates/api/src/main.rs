use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediagen_api::config::AppConfig;
use mediagen_api::router::build_app_router;
use mediagen_api::state::AppState;
use mediagen_db::{JobStore, PgJobStore};
use mediagen_worker::recovery::recover;
use mediagen_worker::{Dispatcher, ExecutionEngine};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mediagen_api=debug,mediagen_worker=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = AppConfig::from_env();
    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        concurrency = config.worker.concurrency,
        "Loaded configuration",
    );

    // --- Database ---
    let pool = mediagen_db::create_pool(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    mediagen_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    mediagen_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(pool));

    // --- Provider and artifact storage ---
    let provider = mediagen_provider::build_provider(&config.provider)
        .expect("Failed to build generation provider");
    let blobs = mediagen_storage::build_blob_store(&config.storage)
        .await
        .expect("Failed to initialise artifact storage");

    // --- Worker pool ---
    let engine = Arc::new(ExecutionEngine::new(
        Arc::clone(&store),
        provider,
        blobs,
        &config.worker,
    ));
    let dispatcher = Dispatcher::start(engine, config.worker.concurrency);

    match recover(store.as_ref(), &dispatcher).await {
        Ok(report) => tracing::info!(
            resolved = report.resolved,
            enqueued = report.enqueued,
            "Unfinished jobs recovered",
        ),
        Err(e) => tracing::error!(error = %e, "Recovery sweep failed"),
    }

    // --- App state ---
    let state = AppState {
        store,
        config: Arc::new(config.server.clone()),
        dispatcher: dispatcher.clone(),
    };

    // --- Router ---
    let app = build_app_router(state, &config.server, &config.storage);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.server.host.parse().expect("Invalid HOST address"),
        config.server.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining workers");

    let drained = dispatcher
        .shutdown(Duration::from_secs(config.server.shutdown_timeout_secs))
        .await;
    if !drained {
        tracing::warn!("Unfinished attempts will resume on next startup");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
