use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;

use store_bootstrap::config::Settings;
use store_bootstrap::postgres::{check_postgres, new_postgres, Database};
use store_bootstrap::redis::{check_redis, new_redis};
use store_bootstrap::server::{create_app, AppState};
use store_bootstrap::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context("load configuration")?;

    // Kept alive until after the cleanups so their spans get exported
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    let bootstrap = tracing::info_span!("bootstrap");

    // A failed ping is fatal to startup even though the handle survives it
    let postgres = new_postgres::<Database>(&settings.database, &bootstrap).await?;
    let (db, postgres_cleanup) = postgres.into_result()?;

    let (redis, redis_cleanup) = match new_redis(&settings.redis, &bootstrap).await {
        Ok(pair) => pair,
        Err(e) => {
            postgres_cleanup.run().await;
            return Err(e.into());
        }
    };

    let state = AppState::new(vec![
        ("postgres".to_string(), check_postgres(db)),
        ("redis".to_string(), check_redis(redis)),
    ]);
    let app = create_app(state);

    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Health endpoints listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Reverse construction order
    redis_cleanup.run().await;
    postgres_cleanup.run().await;

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
