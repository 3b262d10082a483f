use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use atsmaster_api::config::Config;
use atsmaster_api::remote::supabase::SupabaseConnector;
use atsmaster_api::routes::build_router;
use atsmaster_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATSMaster API v{}", env!("CARGO_PKG_VERSION"));

    // Supabase adapter: one HTTP pool, per-request remotes bound to the caller's token
    let connector = SupabaseConnector::new(config.supabase(), config.http_timeout)?;
    info!(
        "Supabase connector initialized ({}, schema {})",
        config.supabase_url, config.supabase_schema
    );

    let state = AppState {
        config: config.clone(),
        connector: Arc::new(connector),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
