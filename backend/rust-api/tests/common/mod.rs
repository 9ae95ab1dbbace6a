use axum::Router;
use std::sync::Arc;

use cricket_top10_api::{config::Config, create_router, services, services::AppState};

/// Builds the app against a live MongoDB. Connection settings come from
/// `.env.test` (falling back to the defaults in `Config::load`); the
/// deployment must be a replica set because guess evaluation runs in
/// multi-document transactions.
pub async fn create_test_app() -> Router {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    // Load test environment from .env.test
    dotenvy::from_filename(".env.test").ok();

    let config = Config::load().expect("Failed to load test configuration");

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to test MongoDB");

    let app_state = Arc::new(
        AppState::new(config, mongo_client)
            .await
            .expect("Failed to initialize test app state"),
    );

    services::seeder::bootstrap(&app_state.mongo)
        .await
        .expect("Failed to bootstrap test database");

    create_router(app_state)
}
