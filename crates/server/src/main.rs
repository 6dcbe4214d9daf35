//! Worklink server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worklink_api::{AppState, auth_middleware, router as api_router};
use worklink_common::Config;
use worklink_core::{
    GateService, ModerationService, NotificationService, SyncService, TicketService,
};
use worklink_db::repositories::{
    ModerationRepository, NotificationRepository, TicketRepository, UserRepository,
};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worklink=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting worklink server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = Arc::new(worklink_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    worklink_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let user_repo = UserRepository::new(db.clone());
    let ticket_repo = TicketRepository::new(db.clone());
    let notification_repo = NotificationRepository::new(db.clone());
    let moderation_repo = ModerationRepository::new(db.clone());

    // Initialize services
    let gate_service = GateService::new(user_repo.clone());
    let notification_service = NotificationService::new(notification_repo);
    let ticket_service = TicketService::new(
        ticket_repo,
        user_repo.clone(),
        notification_service.clone(),
        config.moderation.clone(),
    );
    let moderation_service = ModerationService::new(
        moderation_repo,
        user_repo.clone(),
        notification_service.clone(),
        config.moderation.clone(),
    );
    let sync_service = SyncService::new(
        notification_service.clone(),
        ticket_service.clone(),
        config.sync.clone(),
    );

    let state = AppState {
        user_repo,
        gate_service,
        ticket_service,
        notification_service,
        moderation_service,
        sync_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
