use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::warn;

use crate::{config::AppConfig, error::AppError};

pub type DbPool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<DbPool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Connects to the store, retrying with exponential backoff.
///
/// Only the last failure is returned once `connect_attempts` is exhausted.
pub async fn connect_with_retry(config: &AppConfig) -> Result<DbPool, AppError> {
    let mut backoff = config.connect_backoff;
    let mut attempt = 1;
    loop {
        match init_pool(&config.database_url).await {
            Ok(pool) => return Ok(pool),
            Err(err) if attempt < config.connect_attempts => {
                warn!(
                    "store connection attempt {attempt}/{} failed: {err}; retrying in {backoff:?}",
                    config.connect_attempts
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

pub async fn migrate(pool: &DbPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
