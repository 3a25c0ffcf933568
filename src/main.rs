use std::env;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::info;

mod api;
mod app_env;
mod db;
mod domain;
mod dto;
mod external_connections;
mod logging;
mod persistence;
mod routing_utils;

#[cfg(all(test, feature = "integration_test"))]
mod integration_test;

/// Application state shared across all request handlers
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
}

/// Extractor alias for the application state
pub type AppState = State<Arc<SharedData>>;

/// Assembles the application router around a database pool. Used by both [main] and
/// the integration test harness so tests exercise the exact routes the server exposes.
fn task_manager_router(db: sqlx::PgPool) -> Router {
    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db),
    });

    Router::new()
        .merge(api::task::task_routes())
        .merge(api::swagger_main::build_documentation())
        .with_state(shared_data)
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let env_filter = logging::init_env_filter();
    let otel_exporters = match (
        env::var(app_env::OTEL_SPAN_EXPORT_URL),
        env::var(app_env::OTEL_METRIC_EXPORT_URL),
    ) {
        (Ok(span_url), Ok(metric_url)) => Some(logging::init_exporters(&span_url, &metric_url)),
        _ => None,
    };
    logging::setup_logging_and_tracing(env_filter, otel_exporters);

    let db_url = env::var(app_env::DB_URL)
        .expect("Could not get the database URL from the environment");
    let db_pool = db::connect_sqlx(&db_url).await;

    let router = logging::attach_tracing_http(task_manager_router(db_pool));

    let listener = TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("Could not bind to port 8080");
    info!("Starting server.");
    axum::serve(listener, router)
        .await
        .expect("Server crashed while running");
}
