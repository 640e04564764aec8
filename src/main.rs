//! booking-gateway server entry point.
//!
//! Starts the Axum HTTP server, connects the PostgreSQL pool, runs
//! migrations, and spawns the notification dispatcher.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use booking_gateway::api;
use booking_gateway::app_state::AppState;
use booking_gateway::config::GatewayConfig;
use booking_gateway::domain::EventBus;
use booking_gateway::notify;
use booking_gateway::payments::{HttpCaptureClient, PaymentProcessor};
use booking_gateway::persistence::PostgresBookingStore;
use booking_gateway::persistence::store::{BookingStore, NotificationStore};
use booking_gateway::service::{CaptureCoordinator, TransitionService};

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
    tracing::info!(addr = %config.listen_addr, "starting booking-gateway");

    // Connect PostgreSQL and run migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    // Build domain and service layers
    let store = Arc::new(PostgresBookingStore::new(pool));
    let event_bus = EventBus::new(config.event_bus_capacity);

    let capture_timeout = Duration::from_secs(config.payment_capture_timeout_secs);
    let processor = Arc::new(HttpCaptureClient::new(
        config.payment_api_url.clone(),
        config.payment_api_key.clone(),
        capture_timeout,
    )?);
    let capture = Arc::new(CaptureCoordinator::new(
        Arc::clone(&store) as Arc<dyn BookingStore>,
        processor as Arc<dyn PaymentProcessor>,
        event_bus.clone(),
        capture_timeout,
    ));
    let transition_service = Arc::new(TransitionService::new(
        Arc::clone(&store) as Arc<dyn BookingStore>,
        capture,
        event_bus.clone(),
    ));

    // Notifications run off the bus, never on the request path
    let _dispatcher = notify::spawn_dispatcher(
        &event_bus,
        Arc::clone(&store) as Arc<dyn NotificationStore>,
    );

    // Build application state
    let app_state = AppState { transition_service };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
