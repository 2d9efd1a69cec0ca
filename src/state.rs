//! # Application State
//!
//! Shared state cloned into every request handler: the connection pool, the
//! relying-party identity, the injected account registry, and the
//! verification primitive behind its trait object (so tests can substitute a
//! simulated verifier without touching the ceremonies).

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use sqlx::sqlite::SqlitePool;
use url::Url;

use crate::accounts::AccountRegistry;
use crate::ceremony::RelyingParty;
use crate::config::Config;
use crate::verify::es256::Es256Verifier;
use crate::verify::CeremonyVerifier;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub rp: RelyingParty,
    pub accounts: Arc<AccountRegistry>,
    pub verifier: Arc<dyn CeremonyVerifier>,
    pub challenge_ttl: Duration,
}

impl AppState {
    /// Connect the pool, run migrations, and wire up the ceremony
    /// collaborators from configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = SqlitePool::connect(&config.database_url)
            .await
            .context("connecting to database")?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("running migrations")?;

        // Normalize the configured origin to its ascii serialization so it
        // compares equal to the origin browsers put in clientDataJSON
        // (Url::to_string would append a trailing slash).
        let origin = Url::parse(&config.rp_origin)
            .with_context(|| format!("invalid RP_ORIGIN: {}", config.rp_origin))?
            .origin()
            .ascii_serialization();

        let accounts = AccountRegistry::new(config.accounts.clone());
        if accounts.is_empty() {
            tracing::warn!("no accounts configured; every ceremony will be rejected");
        } else {
            tracing::info!(accounts = accounts.len(), "account registry loaded");
        }

        Ok(AppState {
            db,
            rp: RelyingParty {
                id: config.rp_id.clone(),
                name: config.rp_name.clone(),
                origin,
            },
            accounts: Arc::new(accounts),
            verifier: Arc::new(Es256Verifier),
            challenge_ttl: Duration::seconds(config.challenge_ttl_secs as i64),
        })
    }
}
