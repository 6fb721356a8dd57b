use std::net::SocketAddr;

use anyhow::{Context, Result, ensure};

/// Tracing filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warbler=debug,warbler_api=debug,warbler_db=debug,tower_http=debug";

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite path, or `:memory:`.
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub session_secure: bool,
    /// Minutes of inactivity before a session expires; at least 1.
    pub session_idle_minutes: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "warbler.db".into());
        let host = lookup("WARBLER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = lookup("WARBLER_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("WARBLER_PORT must be a port number")?;
        let session_secure = lookup("WARBLER_SESSION_SECURE")
            .map(|v| v.parse::<bool>())
            .transpose()
            .context("WARBLER_SESSION_SECURE must be true or false")?
            .unwrap_or(false);
        let session_idle_minutes = lookup("WARBLER_SESSION_IDLE_MINUTES")
            .unwrap_or_else(|| "60".into())
            .parse()
            .context("WARBLER_SESSION_IDLE_MINUTES must be a positive whole number")?;
        ensure!(
            session_idle_minutes > 0,
            "WARBLER_SESSION_IDLE_MINUTES must be at least 1"
        );

        Ok(Self {
            database_url,
            host,
            port,
            session_secure,
            session_idle_minutes,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
