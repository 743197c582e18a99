use std::{env, net::SocketAddr, time::Duration};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub project_id: String,
    pub connect_attempts: u32,
    pub connect_backoff: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL must be set".to_string()))?;

        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let project_id =
            env::var("TRIPS_PROJECT_ID").unwrap_or_else(|_| "golangpracticeproject".to_string());

        let connect_attempts: u32 = env::var("STORE_CONNECT_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid STORE_CONNECT_ATTEMPTS: {err}")))?;
        if connect_attempts == 0 {
            return Err(AppError::Config(
                "STORE_CONNECT_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        let connect_backoff = env::var("STORE_CONNECT_BACKOFF_MS")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .map(Duration::from_millis)
            .map_err(|err| AppError::Config(format!("invalid STORE_CONNECT_BACKOFF_MS: {err}")))?;

        Ok(Self {
            database_url,
            listen_addr,
            project_id,
            connect_attempts,
            connect_backoff,
        })
    }
}
