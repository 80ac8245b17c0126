use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;

/// Bounded connection pool shared by all requests. Connections go back to the
/// pool when the borrowing query or transaction is dropped.
#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        info!(max_connections = config.max_connections, "Database pool ready");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}
