use std::time::Duration;

use anyhow::{Context, Result};

use crate::remote::supabase::SupabaseConfig;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_schema: String,
    pub port: u16,
    pub rust_log: String,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            supabase_url: require_env("SUPABASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            supabase_schema: std::env::var("SUPABASE_SCHEMA")
                .unwrap_or_else(|_| "atsmaster".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            http_timeout: Duration::from_secs(
                std::env::var("HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse::<u64>()
                    .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
        })
    }

    pub fn supabase(&self) -> SupabaseConfig {
        SupabaseConfig {
            url: self.supabase_url.clone(),
            anon_key: self.supabase_anon_key.clone(),
            schema: self.supabase_schema.clone(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
