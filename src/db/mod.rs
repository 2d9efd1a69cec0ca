//! # Database Module
//!
//! Storage operations for the two tables the ceremony core owns:
//! - `challenges`: one-time ceremony challenges (issue / atomic consume)
//! - `credentials`: passkey credentials with replay-resistant counters
//!
//! Atomicity requirements are expressed as single SQL statements rather than
//! read-then-write sequences, so two racing requests cannot both win.

pub mod challenges;
pub mod credentials;
pub mod models;

#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    // One connection: every handle must see the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}
