//! # Passkey Gate
//!
//! Passwordless public-key authentication core for a privileged
//! administrative surface. The protocol pieces with real invariants live
//! here: one-time challenge issuance and atomic consumption, the
//! registration and authentication ceremonies, wire-encoding normalization,
//! and credential persistence with replay-resistant signature counters.
//!
//! Cryptographic verification sits behind [`verify::CeremonyVerifier`];
//! session issuance is the HTTP layer's concern after a ceremony succeeds.

pub mod accounts;
pub mod ceremony;
pub mod config;
pub mod db;
pub mod encoding;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod verify;
