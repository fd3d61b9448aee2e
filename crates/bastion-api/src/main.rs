//! Bastion API server entry point.

use std::sync::Arc;

use bastion_api::config::ApiConfig;
use bastion_api::error::AppError;
use bastion_api::routes;
use bastion_api::state::AppState;
use bastion_api::telemetry;
use bastion_core::clock::{Clock, SystemClock};
use bastion_core::id::UuidV7IdGenerator;
use bastion_core::repository::EventRepository;
use bastion_event_store::schema::CREATE_EVENTS_TABLE;
use bastion_event_store::{InMemoryEventRepository, PgEventRepository};
use bastion_projection::{ProjectionStore, Projector};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

async fn event_repository(config: &ApiConfig) -> Result<Arc<dyn EventRepository>, AppError> {
    let Some(database_url) = &config.database_url else {
        warn!("DATABASE_URL not set, events are kept in memory and lost on exit");
        return Ok(Arc::new(InMemoryEventRepository::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;
    sqlx::raw_sql(CREATE_EVENTS_TABLE).execute(&pool).await?;
    Ok(Arc::new(PgEventRepository::new(pool)))
}

async fn shutdown_signal(token: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
    }
    info!("shutdown requested");
    token.cancel();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = ApiConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    info!("Starting Bastion API server");

    let event_repository = event_repository(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let projection = Arc::new(ProjectionStore::starting_at(clock.now()));

    // Replays the whole log into the read model, then keeps tailing it.
    let shutdown = CancellationToken::new();
    let projector = Projector::new(
        event_repository.clone(),
        projection.clone(),
        clock.clone(),
        config.projector,
    )
    .spawn(shutdown.child_token());

    let app_state = AppState::new(
        event_repository,
        projection,
        clock,
        Arc::new(UuidV7IdGenerator),
        config.request_timeout,
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    projector.join().await;
    telemetry.shutdown();

    Ok(())
}
