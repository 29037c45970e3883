//! Sheet server
//!
//! Serves the sheet API over a Postgres-backed ranch database.
//!
//! # Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost:5432/ranch sheet_server --bind 0.0.0.0:3000
//! ```

use std::sync::Arc;

use clap::Parser;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ranch_sheets::api::{create_sheet_router, SheetState};
use ranch_sheets::database::{DatabaseConfig, DatabaseManager};

#[derive(Parser)]
#[command(name = "sheet_server")]
#[command(version = "0.1.0")]
#[command(about = "HTTP server for ranch sheet definitions and resolution")]
struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "SHEET_SERVER_BIND", default_value = "0.0.0.0:3000")]
    bind: String,

    /// Postgres connection URL (falls back to DATABASE_URL)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum pooled connections (falls back to DATABASE_POOL_SIZE)
    #[arg(long, env = "DATABASE_POOL_SIZE")]
    pool_size: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ranch_sheets=info,tower_http=info")),
        )
        .init();

    let args = ServerArgs::parse();

    let config = DatabaseConfig::default().with_overrides(args.database_url, args.pool_size);
    let db = DatabaseManager::new(config).await?;
    db.test_connection().await?;
    db.verify_schema().await?;
    info!("{}", db.connection_stats());

    let state = SheetState::new(Arc::new(db.sheet_store()), Arc::new(db.ranch_store()));

    let app = create_sheet_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
    );

    info!("Starting sheet server on {}", args.bind);
    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    axum::serve(listener, app).await?;

    db.close().await;
    Ok(())
}
