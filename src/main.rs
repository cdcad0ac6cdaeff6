// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan-Tracker API Server
//!
//! Serves user registration, token-based login sessions, and per-user plans
//! that may not overlap in time.

use plan_tracker::{
    config::Config,
    db::{FirestoreDb, MemoryStore, Store},
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment
    let config = Config::from_env()?;

    init_logging(config.is_development());
    tracing::info!(
        port = config.port,
        environment = %config.environment,
        "Starting Plan-Tracker API"
    );

    let store: Arc<dyn Store> = match &config.gcp_project_id {
        Some(project_id) => {
            let db = FirestoreDb::new(project_id).await?;
            tracing::info!(project = %project_id, "Using Firestore store");
            Arc::new(db)
        }
        None => {
            tracing::warn!("GCP_PROJECT_ID not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let port = config.port;
    let state = Arc::new(AppState::new(config, store)?);

    // Build router
    let app = plan_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Initialize logging: JSON for deployed environments, pretty output locally.
fn init_logging(development: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("plan_tracker=debug,info"));

    let registry = tracing_subscriber::registry().with(filter);

    if development {
        registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    }
}
