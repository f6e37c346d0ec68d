use duckdb::Connection;
use heron_exports::api::AppState;
use heron_exports::config::Config;
use heron_exports::{server, storage};
use parking_lot::Mutex;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heron_exports=info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref().map(std::path::Path::new));

    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config
            .database_path
            .as_ref()
            .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string()),
        "Starting export service"
    );

    // Open the warehouse and make sure the schema exists
    let conn = match &config.database_path {
        Some(path) => Connection::open(path).expect("Failed to open DuckDB database"),
        None => Connection::open_in_memory().expect("Failed to open DuckDB"),
    };
    storage::schema::init_schema(&conn).expect("Failed to initialize schema");

    let state = Arc::new(AppState {
        conn: Arc::new(Mutex::new(conn)),
    });

    let app = server::build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!(addr = %addr, "Listening");
    axum::serve(listener, app).await.expect("Server error");
}
