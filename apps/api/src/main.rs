//! # Stockroom Server
//!
//! ```bash
//! STOCKROOM_DATABASE=./stockroom.db STOCKROOM_PORT=8080 stockroom
//!
//! # JSON logs, more detail from the database layer
//! STOCKROOM_LOG_FORMAT=json RUST_LOG=stockroom=debug stockroom
//! ```

use stockroom_api::{create_router, ApiConfig, AppState};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ApiConfig::load()?;
    let addr = config.bind_addr()?;
    info!(
        %addr,
        database = %config.database_path,
        default_store = ?config.default_store,
        "Configuration loaded"
    );

    let state = AppState::connect(config).await?;
    info!("Database ready");

    let router = create_router(state.clone());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Stockroom API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// `STOCKROOM_LOG_FORMAT=json` switches to machine-parseable output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stockroom=info,tower_http=info".into());

    let json = std::env::var("STOCKROOM_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
