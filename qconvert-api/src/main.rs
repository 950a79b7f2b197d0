//! # QConvert API Server
//!
//! REST backend for the QConvert quantum tooling dashboard: accounts,
//! billing, code conversion history, data files and workflow records.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/qconvert JWT_SECRET=... cargo run -p qconvert-api
//! ```
//!
//! Configuration is read from the environment (and `.env` when present);
//! see [`qconvert_api::config`].

use qconvert_api::{
    app::{build_router, AppState},
    config::Config,
};
use qconvert_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.api.json_logs);

    tracing::info!("QConvert API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    tracing::info!("Database pool ready");

    run_migrations(&pool).await?;

    let state = AppState::new(pool.clone(), config)?;
    state.uploads.ensure_dir().await?;

    let addr = state.config.bind_address();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "qconvert_api=debug,qconvert_shared=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
