//! Process configuration, read from the environment at startup.

use anyhow::Context;

/// Everything the binary needs from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Redis connection string.
    pub redis_url: String,
    /// Secret used to sign and verify QR tokens.
    pub qr_secret: String,
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
}

impl ServerConfig {
    /// Read configuration from the environment.
    ///
    /// `DATABASE_URL` and `QR_SECRET` are required; `REDIS_URL` and
    /// `BIND_ADDR` fall back to local defaults.
    ///
    /// # Errors
    ///
    /// Returns an error naming the missing required variable.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let qr_secret = std::env::var("QR_SECRET").context("QR_SECRET must be set")?;
        let redis_url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_owned());
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_owned());

        Ok(Self {
            database_url,
            redis_url,
            qr_secret,
            bind_addr,
        })
    }
}
