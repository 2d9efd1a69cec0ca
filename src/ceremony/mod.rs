//! # Ceremony Orchestration
//!
//! The two WebAuthn ceremonies this core exists for. Each is a begin/finish
//! pair: `begin` builds client options around a fresh one-time challenge,
//! the authenticator does its work out-of-band, and `finish` consumes the
//! challenge, delegates to the verification primitive, and updates the
//! credential store.
//!
//! ## Submodules
//! - `types`: wire-level option and request structures
//! - `registration`: adding a new credential to an account
//! - `authentication`: verifying a login attempt against a stored credential

pub mod authentication;
pub mod registration;
pub mod types;

/// How long a client has to complete a ceremony, advertised in the options.
pub const CEREMONY_TIMEOUT_MS: u32 = 60_000;

/// The single relying-party identity this deployment verifies ceremonies for.
#[derive(Debug, Clone)]
pub struct RelyingParty {
    /// Effective domain, e.g. "admin.example.com".
    pub id: String,
    /// Human-readable service name shown during credential creation.
    pub name: String,
    /// Full web origin, e.g. "https://admin.example.com".
    pub origin: String,
}

#[cfg(test)]
pub(crate) mod testsupport {
    use std::sync::Arc;

    use chrono::Duration;

    use super::RelyingParty;
    use crate::accounts::AccountRegistry;
    use crate::state::AppState;
    use crate::verify::CeremonyVerifier;

    pub const TEST_ACCOUNT: &str = "admin@example.com";
    pub const TEST_ORIGIN: &str = "http://localhost:8080";
    pub const TEST_RP_ID: &str = "localhost";

    pub async fn test_state(verifier: Arc<dyn CeremonyVerifier>) -> AppState {
        AppState {
            db: crate::db::test_pool().await,
            rp: RelyingParty {
                id: TEST_RP_ID.to_string(),
                name: "Passkey Gate Test".to_string(),
                origin: TEST_ORIGIN.to_string(),
            },
            accounts: Arc::new(AccountRegistry::new(vec![TEST_ACCOUNT.to_string()])),
            verifier,
            challenge_ttl: Duration::seconds(300),
        }
    }
}
