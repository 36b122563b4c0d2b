use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use melodyhub_server::config::AppConfig;
use melodyhub_server::create_router;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("melodyhub_server=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to create database pool.");

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    info!("Database connection pool established.");

    let app = create_router(db_pool, &config);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
