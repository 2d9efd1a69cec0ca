//! # Challenge Store
//!
//! Issues one-time random challenges and consumes them atomically. The
//! consume operations are single `DELETE ... RETURNING` statements: the row
//! is gone the instant it is read, so two requests racing to complete the
//! same ceremony cannot both succeed. That delete-on-read is the primary
//! defense against replaying a captured signed response.
//!
//! A consumed, expired, or never-issued id all resolve to `None` — callers
//! (and therefore callers' error messages) cannot tell the cases apart.

use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::SqlitePool;

use crate::db::models::{Challenge, ChallengePurpose};
use crate::error::AppResult;

/// Challenge entropy in bytes. WebAuthn requires at least 16; we issue 32.
const CHALLENGE_LEN: usize = 32;

/// Generate and persist a fresh challenge, returning it to the caller for
/// inclusion in ceremony options.
pub async fn issue(pool: &SqlitePool, purpose: ChallengePurpose, ttl: Duration) -> AppResult<Challenge> {
    let mut value = vec![0u8; CHALLENGE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut value);

    let challenge = Challenge::new(purpose, value, ttl);

    sqlx::query(
        "INSERT INTO challenges (id, purpose, value, created_at, expires_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&challenge.id)
    .bind(&challenge.purpose)
    .bind(&challenge.value)
    .bind(&challenge.created_at)
    .bind(&challenge.expires_at)
    .execute(pool)
    .await?;

    Ok(challenge)
}

/// Atomic fetch-and-delete by id.
pub async fn consume_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Challenge>> {
    let challenge = sqlx::query_as::<_, Challenge>(
        "DELETE FROM challenges WHERE id = ?
         RETURNING id, purpose, value, created_at, expires_at",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    // An expired row is consumed (deleted) but reported as not-found.
    Ok(challenge.filter(|c| !c.is_expired()))
}

/// Fallback resolution: atomically consume the most recent unconsumed
/// challenge of the given purpose whose value matches.
///
/// Only used when a ceremony cannot carry its challenge id across the client
/// flow; the id path is always tried first.
pub async fn consume_by_value(
    pool: &SqlitePool,
    purpose: ChallengePurpose,
    value: &[u8],
) -> AppResult<Option<Challenge>> {
    let challenge = sqlx::query_as::<_, Challenge>(
        "DELETE FROM challenges WHERE id = (
             SELECT id FROM challenges
             WHERE purpose = ? AND value = ?
             ORDER BY created_at DESC
             LIMIT 1
         )
         RETURNING id, purpose, value, created_at, expires_at",
    )
    .bind(purpose.as_str())
    .bind(value)
    .fetch_optional(pool)
    .await?;

    Ok(challenge.filter(|c| !c.is_expired()))
}

/// Remove challenges left behind by abandoned ceremonies. Run periodically
/// from the background task in `main`.
pub async fn cleanup_expired(pool: &SqlitePool) -> AppResult<u64> {
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query("DELETE FROM challenges WHERE expires_at < ?")
        .bind(&now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
