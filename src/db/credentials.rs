//! # Credential Store
//!
//! Persists passkey credentials keyed by (account, credential id). The
//! counter update is a single conditional `UPDATE`: the non-regression check
//! runs against the row value visible at write time, so two cloned
//! authenticators racing the same credential cannot slip a replayed counter
//! through a lost update.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::Credential;
use crate::error::AppResult;

/// Insert or refresh a credential. Idempotent by (account, credential_id);
/// only the registration ceremony calls this.
pub async fn upsert(
    pool: &SqlitePool,
    account: &str,
    credential_id: &str,
    public_key: &[u8],
    sign_count: u32,
) -> AppResult<()> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO credentials (account, credential_id, public_key, sign_count, created_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (account, credential_id) DO UPDATE SET
             public_key = excluded.public_key,
             sign_count = excluded.sign_count",
    )
    .bind(account)
    .bind(credential_id)
    .bind(public_key)
    .bind(sign_count as i64)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find(
    pool: &SqlitePool,
    account: &str,
    credential_id: &str,
) -> AppResult<Option<Credential>> {
    let credential = sqlx::query_as::<_, Credential>(
        "SELECT account, credential_id, public_key, sign_count, created_at, last_used_at
         FROM credentials
         WHERE account = ? AND credential_id = ?",
    )
    .bind(account)
    .bind(credential_id)
    .fetch_optional(pool)
    .await?;

    Ok(credential)
}

/// Canonical credential ids for one account. Exclusion list during
/// registration, allow-list during authentication.
pub async fn list_ids(pool: &SqlitePool, account: &str) -> AppResult<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT credential_id FROM credentials WHERE account = ? ORDER BY created_at",
    )
    .bind(account)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Full credential rows for one account, for the admin credential listing.
pub async fn list(pool: &SqlitePool, account: &str) -> AppResult<Vec<Credential>> {
    let credentials = sqlx::query_as::<_, Credential>(
        "SELECT account, credential_id, public_key, sign_count, created_at, last_used_at
         FROM credentials
         WHERE account = ?
         ORDER BY created_at",
    )
    .bind(account)
    .fetch_all(pool)
    .await?;

    Ok(credentials)
}

/// Record a successful authentication: advance the counter and stamp
/// `last_used_at` in one atomic write.
///
/// Returns `false` when the stored counter is already ahead of `new_count`,
/// in which case nothing was written and the caller must treat the ceremony
/// as a counter regression.
pub async fn update_counter(
    pool: &SqlitePool,
    account: &str,
    credential_id: &str,
    new_count: u32,
) -> AppResult<bool> {
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        "UPDATE credentials
         SET sign_count = ?, last_used_at = ?
         WHERE account = ? AND credential_id = ? AND sign_count <= ?",
    )
    .bind(new_count as i64)
    .bind(&now)
    .bind(account)
    .bind(credential_id)
    .bind(new_count as i64)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    const ACCOUNT: &str = "admin@example.com";

    #[tokio::test]
    async fn upsert_is_idempotent_per_account_and_id() {
        let pool = test_pool().await;
        upsert(&pool, ACCOUNT, "cred-a", b"key-1", 0).await.unwrap();
        upsert(&pool, ACCOUNT, "cred-a", b"key-2", 3).await.unwrap();
        upsert(&pool, "other@example.com", "cred-a", b"key-3", 0)
            .await
            .unwrap();

        let stored = find(&pool, ACCOUNT, "cred-a").await.unwrap().unwrap();
        assert_eq!(stored.public_key, b"key-2");
        assert_eq!(stored.sign_count, 3);
        assert_eq!(list_ids(&pool, ACCOUNT).await.unwrap(), vec!["cred-a"]);
    }

    #[tokio::test]
    async fn find_is_scoped_to_the_account() {
        let pool = test_pool().await;
        upsert(&pool, ACCOUNT, "cred-a", b"key", 0).await.unwrap();
        assert!(find(&pool, "other@example.com", "cred-a")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn counter_update_accepts_non_decreasing_values() {
        let pool = test_pool().await;
        upsert(&pool, ACCOUNT, "cred-a", b"key", 5).await.unwrap();

        assert!(update_counter(&pool, ACCOUNT, "cred-a", 6).await.unwrap());
        assert!(update_counter(&pool, ACCOUNT, "cred-a", 6).await.unwrap());

        let stored = find(&pool, ACCOUNT, "cred-a").await.unwrap().unwrap();
        assert_eq!(stored.sign_count, 6);
        assert!(stored.last_used_at.is_some());
    }

    #[tokio::test]
    async fn counter_regression_writes_nothing() {
        let pool = test_pool().await;
        upsert(&pool, ACCOUNT, "cred-a", b"key", 5).await.unwrap();

        assert!(!update_counter(&pool, ACCOUNT, "cred-a", 4).await.unwrap());

        let stored = find(&pool, ACCOUNT, "cred-a").await.unwrap().unwrap();
        assert_eq!(stored.sign_count, 5);
        assert!(stored.last_used_at.is_none());
    }
}
