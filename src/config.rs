//! # Configuration Management
//!
//! Configuration comes from environment variables (with a `.env` file for
//! local development). The relying-party identity and the account registry
//! are deployment facts, never code constants.
//!
//! ## Environment Variables
//! - `HOST` / `PORT`: server bind address (default 127.0.0.1:8080)
//! - `DATABASE_URL`: SQLite connection string
//! - `RP_ID`: relying-party id, the effective domain (e.g. "localhost")
//! - `RP_ORIGIN`: full web origin the ceremonies bind to
//! - `RP_NAME`: human-readable service name
//! - `ADMIN_ACCOUNTS`: comma-separated account identifiers allowed to own
//!   credentials; empty means the deployment rejects every ceremony
//! - `CHALLENGE_TTL_SECS`: how long an unconsumed challenge stays valid

use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,

    /// Relying-party id; must match the domain the admin surface is served
    /// from ("localhost" for development, "admin.example.com" in production).
    pub rp_id: String,

    /// Full origin including scheme, e.g. "https://admin.example.com".
    pub rp_origin: String,

    /// Name shown to the user during passkey creation.
    pub rp_name: String,

    /// Accounts provisioned to own credentials on this deployment.
    pub accounts: Vec<String>,

    /// Challenge time-to-live in seconds.
    pub challenge_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:passkey-gate.db?mode=rwc".to_string()),
            rp_id: env::var("RP_ID").unwrap_or_else(|_| "localhost".to_string()),
            rp_origin: env::var("RP_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            rp_name: env::var("RP_NAME").unwrap_or_else(|_| "Passkey Gate".to_string()),
            accounts: env::var("ADMIN_ACCOUNTS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect(),
            challenge_ttl_secs: env::var("CHALLENGE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()?,
        })
    }

    /// Socket address for the TCP listener, e.g. "127.0.0.1:8080".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
