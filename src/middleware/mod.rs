//! # Middleware
//!
//! Cross-cutting request interception. Currently only the session gate that
//! protects the privileged routes.

pub mod auth;
