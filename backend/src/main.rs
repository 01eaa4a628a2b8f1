use axum::Router;
use scheduler::{
    db::{migrations::run_migrations, DatabaseConfig, PgAvailabilityStore},
    engine::AvailabilityCoordinator,
    get_db_pool, handlers, utils, Config,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    // Run migrations
    run_migrations(&pool).await?;

    let coordinator = Arc::new(AvailabilityCoordinator::new(PgAvailabilityStore::new(pool)));

    let port = config.port;
    let app = create_router(coordinator, &config);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(coordinator: Arc<AvailabilityCoordinator<PgAvailabilityStore>>, config: &Config) -> Router {
    handlers::routes(coordinator)
        .layer(handlers::cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}
