//! # Database Models
//!
//! Row types for the two tables this core owns. Timestamps are stored as
//! RFC3339 text, matching SQLite's affinity for string comparison in the
//! expiry sweep.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// What a challenge was issued for. A register challenge can never complete
/// a login ceremony, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePurpose {
    Register,
    Login,
}

impl ChallengePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            ChallengePurpose::Register => "register",
            ChallengePurpose::Login => "login",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "register" => Some(ChallengePurpose::Register),
            "login" => Some(ChallengePurpose::Login),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChallengePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A one-time ceremony challenge.
///
/// Consumption is destructive: the row is deleted in the same statement that
/// reads it, so a challenge id can complete at most one ceremony.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Challenge {
    /// Unguessable challenge id (UUID v4), handed to the caller with the
    /// ceremony options.
    pub id: String,

    /// "register" or "login".
    pub purpose: String,

    /// High-entropy random value the client signs over (32 bytes).
    pub value: Vec<u8>,

    /// RFC3339 creation timestamp.
    pub created_at: String,

    /// RFC3339 expiry. An abandoned ceremony leaves the row behind until the
    /// sweep removes it; an expired row consumes as not-found.
    pub expires_at: String,
}

impl Challenge {
    pub fn new(purpose: ChallengePurpose, value: Vec<u8>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            purpose: purpose.as_str().to_string(),
            value,
            created_at: now.to_rfc3339(),
            expires_at: (now + ttl).to_rfc3339(),
        }
    }

    pub fn purpose(&self) -> Option<ChallengePurpose> {
        ChallengePurpose::parse(&self.purpose)
    }

    pub fn is_expired(&self) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires) => Utc::now() > expires,
            // An unparseable expiry is treated as expired, never as valid.
            Err(_) => true,
        }
    }
}

/// A registered passkey credential.
///
/// Only the public key and metadata live server-side; the private key never
/// leaves the authenticator. Unique per (account, credential_id).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Credential {
    /// Owning account identifier (e.g. an email address).
    pub account: String,

    /// Canonical (unpadded base64url) credential id.
    pub credential_id: String,

    /// Uncompressed SEC1 P-256 public key bytes.
    pub public_key: Vec<u8>,

    /// Authenticator signature counter. Incremented by the device on each
    /// use; a regression means a cloned authenticator.
    pub sign_count: i64,

    /// RFC3339 registration timestamp.
    pub created_at: String,

    /// RFC3339 timestamp of the last successful authentication.
    pub last_used_at: Option<String>,
}
