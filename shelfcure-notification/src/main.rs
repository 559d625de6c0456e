use axum::routing::{get, patch, post};
use axum::Router;
use socketioxide::SocketIo;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod dispatch;
mod events;
mod models;
mod routes;
mod scanners;
mod scheduler;
mod schema;
mod services;
mod socket;

use config::AppConfig;
use dispatch::StoreChannels;
use shelfcure_shared::clients::db::{create_pool, DbPool};
use shelfcure_shared::clients::rabbitmq::RabbitMQClient;
use shelfcure_shared::middleware::{init_metrics, metrics_middleware};

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub channels: StoreChannels,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shelfcure_shared::middleware::init_tracing("shelfcure-notification");

    let config = AppConfig::load()?;
    let port = config.port;

    // Set JWT_SECRET env var for the auth extractor middleware
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = create_pool(&config.database_url)?;
    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let metrics_handle = init_metrics()?;

    // Build Socket.IO layer for the realtime notification channel
    let (sio_layer, io) = SocketIo::builder().build_layer();

    let state = Arc::new(AppState {
        db,
        config,
        rabbitmq,
        channels: StoreChannels::new(),
    });

    // Configure the Socket.IO namespace with state via closure
    io.ns("/", {
        let state = state.clone();
        move |socket: socketioxide::extract::SocketRef| {
            let state = state.clone();
            async move {
                socket::handlers::on_connect_with_state(socket, state).await;
            }
        }
    });

    // Spawn inventory event subscriber
    let inventory_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_inventory_events(inventory_state).await {
            tracing::error!(error = %e, "inventory event subscriber failed");
        }
    });

    // Spawn whatsapp event subscriber
    let whatsapp_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_whatsapp_events(whatsapp_state).await {
            tracing::error!(error = %e, "whatsapp event subscriber failed");
        }
    });

    // Spawn the scheduled scan loop
    let scheduler_state = state.clone();
    tokio::spawn(async move {
        scheduler::run_scan_loop(scheduler_state).await;
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(move || async move { metrics_handle.render() }))
        .route("/notifications", get(routes::notifications::list_notifications))
        .route("/notifications/unread-count", get(routes::notifications::unread_count))
        .route("/notifications/generate", post(routes::notifications::generate))
        .route("/notifications/mark-all-read", post(routes::notifications::mark_all_read))
        .route("/notifications/:id/read", patch(routes::notifications::mark_read))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(sio_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "shelfcure-notification starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
