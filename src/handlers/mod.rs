//! # HTTP Request Handlers
//!
//! Route handlers for the gate's API surface.
//!
//! ## Submodules
//! - `health`: liveness endpoint
//! - `auth`: ceremony endpoints (register, authenticate, logout, session)
//! - `credentials`: credential listing for the signed-in account

pub mod auth;
pub mod credentials;
pub mod health;
