use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub history_debounce_ms: u64,
    pub history_min_plot_id_len: usize,
    pub strict_plot_id: bool,
    pub created_by: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load from .env file if available

        Ok(Config {
            app_name: env::var("PORTAL_APP_NAME").unwrap_or_else(|_| "soil-portal".to_string()),
            api_url: env::var("PORTAL_API_URL").context("PORTAL_API_URL must be set")?,
            request_timeout_secs: parse_var("PORTAL_REQUEST_TIMEOUT_SECS", 30)?,
            history_debounce_ms: parse_var("PORTAL_HISTORY_DEBOUNCE_MS", 500)?,
            history_min_plot_id_len: parse_var("PORTAL_HISTORY_MIN_PLOT_ID_LEN", 3)?,
            strict_plot_id: parse_var("PORTAL_STRICT_PLOT_ID", false)?,
            created_by: env::var("PORTAL_CREATED_BY").unwrap_or_else(|_| "Internal".to_string()),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn history_debounce(&self) -> Duration {
        Duration::from_millis(self.history_debounce_ms)
    }

    pub fn for_tests() -> Self {
        Config {
            app_name: "soil-portal-test".to_string(),
            api_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 5,
            history_debounce_ms: 0,
            history_min_plot_id_len: 3,
            strict_plot_id: false,
            created_by: "Internal".to_string(),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
