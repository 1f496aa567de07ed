use std::net::SocketAddr;

use anyhow::{Context, Result};

const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_API_PREFIX: &str = "/api-v2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Normalized to start with `/` and never end with one; empty means the root.
    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self> { Self::from_lookup(|key| std::env::var(key).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| {
                tracing::debug!("{key} not set, using default: {default}");
                default.to_string()
            })
        };

        let bind_addr = var("BIND_ADDR", DEFAULT_BIND_ADDR);
        Ok(Self {
            database_url: var("DATABASE_URL", DEFAULT_DATABASE_URL),
            bind_addr: bind_addr
                .parse()
                .with_context(|| format!("invalid BIND_ADDR {bind_addr:?}"))?,
            api_prefix: normalize_prefix(&var("API_PREFIX", DEFAULT_API_PREFIX)),
        })
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
}
