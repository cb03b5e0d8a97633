use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio::task;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seat_allocation::{
    config::{Config, LogFormat},
    controllers,
    services::cleanup::CleanupService,
    AppState,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let registry = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&config.app.rust_log));
    match config.app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    info!("Starting seat allocation service ({})", config.app.environment);

    // Connect Postgres and Redis, run migrations
    let app_state = AppState::new(config.clone()).await?;

    // --- Start background tasks ---

    // Drop allocation sessions nobody touched for a while
    let cleanup = CleanupService::new(app_state.clone());
    task::spawn(cleanup.run());

    // --- Start the web server ---

    let app = Router::new()
        .route("/", get(|| async { "Seat Allocation API v1.0" }))
        .merge(controllers::health::routes())
        .nest("/api", controllers::routes())
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
