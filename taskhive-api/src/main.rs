//! # TaskHive API Server
//!
//! Multi-tenant task-tracking service: user accounts with role-based
//! authorization, JWT sessions with refresh rotation, and task lists whose
//! task membership is kept consistent on every write.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/taskhive \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p taskhive-api
//! ```

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskhive_api::{app, config::Config};
use taskhive_core::store::{create_pool, run_migrations, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhive_api=debug,taskhive_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskHive API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(&config.database.url, config.database.max_connections).await?;
    run_migrations(&pool).await?;
    let store = Arc::new(PgStore::new(pool));

    let bind_address = config.bind_address();
    let state = app::AppState::new(store, config);
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutdown signal received, draining...");
    }
}
