use axum::http::{HeaderValue, Method};
use linka::{AppState, Config, create_router, get_db_pool, utils};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let db_config = linka::db::DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    // Run migrations
    linka::db::migrations::run_migrations(&pool).await?;

    let port = config.port;
    let cors_layer = create_cors_layer(&config);
    let state = AppState::new(pool, config);

    if state.config.run_sweeper {
        let sweeper = state.sweeper();
        let interval_secs = state.config.sweep_interval_secs;
        tokio::spawn(sweeper.run(interval_secs));
        tracing::info!("Sweeper running every {}s", interval_secs);
    }

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|origin| {
            let trimmed = origin.trim();
            if !trimmed.is_empty() {
                trimmed.parse().ok()
            } else {
                None
            }
        })
        .collect();

    if origins.is_empty() {
        // Permissive for development
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}
