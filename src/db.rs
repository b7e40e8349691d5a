use crate::config::AppConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{error, info};

/// Type alias for database connection pool
pub type DbPool = DatabaseConnection;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 16,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(app_config: &AppConfig) -> Self {
        Self {
            url: app_config.database_url.clone(),
            max_connections: app_config.db_max_connections,
            min_connections: app_config.db_min_connections,
            connect_timeout: Duration::from_secs(app_config.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(app_config.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(app_config.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a database connection with default pool settings
pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..DbConfig::default()
    };
    establish_connection_with_config(&config).await
}

/// Establishes a database connection with the specified pool configuration
pub async fn establish_connection_with_config(
    config: &DbConfig,
) -> Result<DatabaseConnection, DbErr> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to database"
    );

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .acquire_timeout(config.acquire_timeout)
        .sqlx_logging(true);

    let pool = Database::connect(options).await.map_err(|e| {
        error!("Failed to connect to database: {}", e);
        e
    })?;

    info!("Database connection established");
    Ok(pool)
}

/// Establishes a database connection using settings from the application config
pub async fn establish_connection_from_app_config(
    app_config: &AppConfig,
) -> Result<DatabaseConnection, DbErr> {
    let db_config = DbConfig::from(app_config);
    establish_connection_with_config(&db_config).await
}

/// Runs pending database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbErr> {
    info!("Running database migrations");
    let started = std::time::Instant::now();

    crate::migrator::Migrator::up(pool, None).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        e
    })?;

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Database migrations completed"
    );
    Ok(())
}

/// Checks database connectivity by issuing a ping
pub async fn check_connection(pool: &DbPool) -> Result<(), DbErr> {
    pool.ping().await.map_err(|e| {
        error!("Database health check failed: {}", e);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn establishes_a_connection_and_answers_pings() {
        let pool = establish_connection("sqlite::memory:")
            .await
            .expect("Failed to establish connection");
        assert!(check_connection(&pool).await.is_ok());
    }

    // A file-backed database here: every pooled connection to sqlite::memory:
    // opens its own empty database, so migrations need a shared file.
    #[tokio::test]
    async fn runs_migrations_on_a_fresh_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("migrate.db").display()
        );
        let pool = establish_connection(&url)
            .await
            .expect("Failed to establish connection");
        assert!(run_migrations(&pool).await.is_ok());
    }

    #[test]
    fn db_config_from_app_config_maps_pool_settings() {
        let mut app_config = AppConfig::new(
            "sqlite::memory:".to_string(),
            "x".repeat(64),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            8080,
            "development".to_string(),
        );
        app_config.db_max_connections = 5;
        app_config.db_min_connections = 1;
        app_config.db_connect_timeout_secs = 3;

        let db_config = DbConfig::from(&app_config);
        assert_eq!(db_config.url, "sqlite::memory:");
        assert_eq!(db_config.max_connections, 5);
        assert_eq!(db_config.min_connections, 1);
        assert_eq!(db_config.connect_timeout, Duration::from_secs(3));
    }
}
