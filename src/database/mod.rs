//! Database connection and management module
//!
//! Connection pooling and configuration for the Postgres-backed ranch and
//! sheet stores.

use sqlx::Row;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::{info, warn};

pub mod ranch_repository;
pub mod sheet_repository;

pub use ranch_repository::PgRanchStore;
pub use sheet_repository::PgSheetStore;

/// Tables the resolvers and the sheet store read from
const REQUIRED_TABLES: [&str; 12] = [
    "cows",
    "weight_records",
    "medicines",
    "medical_records",
    "breeding_plans",
    "breeding_records",
    "pregnancy_checks",
    "calving_records",
    "herds",
    "weaning_records",
    "sheets",
    "sheet_instances",
];

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost:5432/ranch".to_string()),
            max_connections: std::env::var("DATABASE_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)), // 10 minutes
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
        }
    }
}

impl DatabaseConfig {
    /// Overrides the URL and pool size, keeping defaults for the rest
    pub fn with_overrides(mut self, database_url: Option<String>, pool_size: Option<u32>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(size) = pool_size {
            self.max_connections = size;
        }
        self
    }
}

/// Database connection manager
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Create a new database manager with the given configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self, sqlx::Error> {
        info!(
            "Connecting to database: {}",
            mask_database_url(&config.database_url)
        );

        let mut pool_options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connection_timeout);

        if let Some(idle_timeout) = config.idle_timeout {
            pool_options = pool_options.idle_timeout(idle_timeout);
        }

        if let Some(max_lifetime) = config.max_lifetime {
            pool_options = pool_options.max_lifetime(max_lifetime);
        }

        let pool = pool_options
            .connect(&config.database_url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                e
            })?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn ranch_store(&self) -> PgRanchStore {
        PgRanchStore::new(self.pool.clone())
    }

    pub fn sheet_store(&self) -> PgSheetStore {
        PgSheetStore::new(self.pool.clone())
    }

    /// Test database connectivity
    pub async fn test_connection(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
    }

    /// Checks that every table the stores read is present.
    /// Apply `migrations/001_ranch_sheets.sql` when this fails.
    pub async fn verify_schema(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Verifying database schema");

        let tables = REQUIRED_TABLES
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>();
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM information_schema.tables
            WHERE table_schema = current_schema()
            AND table_name = ANY($1)
            "#,
        )
        .bind(&tables)
        .fetch_one(&self.pool)
        .await
        .map_err(sqlx::migrate::MigrateError::Execute)?;

        let count: i64 = row.get("count");

        if count < REQUIRED_TABLES.len() as i64 {
            warn!(
                "Expected {} ranch tables, found {}. Apply migrations/001_ranch_sheets.sql",
                REQUIRED_TABLES.len(),
                count
            );
            return Err(sqlx::migrate::MigrateError::VersionMissing(1));
        }

        info!("Database schema verification complete");
        Ok(())
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        ConnectionStats {
            size: self.pool.size(),
            num_idle: self.pool.num_idle() as u32,
        }
    }

    /// Close the database connection pool
    pub async fn close(self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }
}

/// Database connection statistics
#[derive(Debug, Clone)]
pub struct ConnectionStats {
    pub size: u32,
    pub num_idle: u32,
}

impl std::fmt::Display for ConnectionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pool size: {}, Idle: {}", self.size, self.num_idle)
    }
}

/// Mask sensitive information in database URL for logging
pub fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut masked = parsed.clone();
        if parsed.password().is_some() {
            let _ = masked.set_password(Some("***"));
        }
        masked.to_string()
    } else if url.len() > 20 && url.is_ascii() {
        format!("{}***{}", &url[..10], &url[url.len() - 10..])
    } else {
        "***".to_string()
    }
}
