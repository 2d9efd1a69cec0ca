//! Credential listing for the signed-in account. Sits behind the auth
//! middleware, so a session is guaranteed to exist by the time we run.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::db::credentials;
use crate::error::{AppError, AppResult};
use crate::handlers::auth::SESSION_ACCOUNT_KEY;
use crate::state::AppState;

/// GET /api/credentials — the account's registered passkeys, without the
/// public key material.
pub async fn list_credentials(
    session: Session,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    let account: String = session
        .get(SESSION_ACCOUNT_KEY)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {}", e)))?
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    let rows = credentials::list(&state.db, &account).await?;
    let listed: Vec<Value> = rows
        .into_iter()
        .map(|c| {
            json!({
                "credentialId": c.credential_id,
                "signCount": c.sign_count,
                "createdAt": c.created_at,
                "lastUsedAt": c.last_used_at,
            })
        })
        .collect();

    Ok(Json(json!({
        "account": account,
        "credentials": listed,
    })))
}
