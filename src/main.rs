use notes_backend::{
    app::{self, AppState},
    config::Config,
    repository::Database,
};

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Log setup
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::error!("Invalid configuration: {e}");
        panic!("invalid configuration: {e}");
    });

    // Database connection and migration
    let database = Database::connect(&config.database_url, config.max_connections)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to establish database connection: {e}");
            panic!("failed to establish database connection: {e}");
        });

    database.migrate().await.unwrap_or_else(|e| {
        tracing::error!("Failed to migrate database: {e}");
        panic!("failed to migrate database: {e}");
    });

    // Router config
    let router = app::router(AppState::new(database), &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind {}: {e}", config.bind_address());
            panic!("failed to bind {}: {e}", config.bind_address());
        });

    match listener.local_addr() {
        Ok(addr) => {
            tracing::info!("Notes API listening on {}", addr);
            tracing::info!("Swagger UI at http://{}/docs", addr);
        }
        Err(e) => tracing::warn!("Could not read local address: {e}"),
    }

    // Starting router
    axum::serve(listener, router)
        .await
        .expect("failed to start server");
}
