//! Application Configuration

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
    pub api_url: String,
    pub database_url: String,
    pub db_max_open_conns: u32,
    pub db_max_idle_conns: u32,
    pub db_max_idle_time: Duration,
    pub gemini_model: String,
    pub gemini_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            env: env::var("ENV").unwrap_or_else(|_| "development".into()),
            port: env::var("PORT").unwrap_or_else(|_| "8080".into()).parse()?,
            api_url: env::var("API_URL").unwrap_or_else(|_| "http://localhost:8080".into()),
            database_url: required("DATABASE_URL")?,
            db_max_open_conns: env::var("DB_MAX_OPEN_CONNS")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
            db_max_idle_conns: env::var("DB_MAX_IDLE_CONNS")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
            db_max_idle_time: Duration::from_secs(
                env::var("DB_MAX_IDLE_TIME")
                    .unwrap_or_else(|_| "10".into())
                    .parse()?,
            ),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash-lite".into()),
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|s| !s.is_empty()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
