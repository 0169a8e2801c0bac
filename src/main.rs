//! lumen-gateway server entry point.
//!
//! Wires the transport channel, event bus, projections, and services,
//! then starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use lumen_gateway::api;
use lumen_gateway::app_state::AppState;
use lumen_gateway::config::GatewayConfig;
use lumen_gateway::domain::{DeviceStore, EventBus};
use lumen_gateway::persistence::{EventLogger, PostgresPersistence};
use lumen_gateway::service::{ControlService, EnergyAggregator, HttpFallback};
use lumen_gateway::transport::{TcpLink, TransportChannel};
use lumen_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, bridge = %config.bridge_addr, "starting lumen-gateway");

    // Build domain layer
    let bus = EventBus::new();
    let store = Arc::new(DeviceStore::new());
    store.attach(&bus);
    let energy = Arc::new(EnergyAggregator::new());
    energy.attach(&bus);

    // Bridge transport
    let link = Arc::new(TcpLink::new(config.bridge_addr.clone()));
    let transport = Arc::new(TransportChannel::new(link, bus.clone(), config.transport()));
    transport.connect();

    // Command dispatch with HTTP fallback
    let fallback = Arc::new(HttpFallback::new(
        config.fallback_url.clone(),
        config.fallback_timeout,
    )?);
    let control = ControlService::new(
        Arc::clone(&transport),
        bus.clone(),
        fallback,
        config.command_timeout,
    );

    // Durable event log (best-effort; connects lazily)
    let mut event_logger = None;
    if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect_lazy(&config.database_url)?;
        let persistence = PostgresPersistence::new(pool);

        if config.cleanup_after_days > 0 {
            let retention = persistence.clone();
            let days = config.cleanup_after_days;
            tokio::spawn(async move {
                let mut interval =
                    tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
                loop {
                    interval.tick().await;
                    match retention.delete_old_events(days).await {
                        Ok(deleted) if deleted > 0 => {
                            tracing::info!(deleted, "cleaned up old events");
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!(error = %e, "event cleanup failed"),
                    }
                }
            });
        }

        event_logger = Some(EventLogger::spawn(&bus, persistence));
    }

    // Build application state
    let app_state = AppState {
        control,
        store,
        energy,
        transport,
        bus,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    if let Some(logger) = event_logger {
        logger.shutdown();
    }

    Ok(())
}
