//! Ceremony endpoints plus session management. The session insert after a
//! successful authentication is the caller-side hookup to the session layer;
//! the ceremonies themselves never touch sessions.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::ceremony::types::*;
use crate::ceremony::{authentication, registration};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub(crate) const SESSION_ACCOUNT_KEY: &str = "account";

// Registration endpoints

pub async fn register_start(
    State(state): State<AppState>,
    Json(req): Json<BeginRequest>,
) -> AppResult<Json<Value>> {
    let (challenge_id, options) = registration::begin(&state, req.account.as_deref()).await?;

    Ok(Json(json!({
        "challengeId": challenge_id,
        "publicKey": options,
    })))
}

pub async fn register_finish(
    State(state): State<AppState>,
    Json(req): Json<RegistrationFinishRequest>,
) -> AppResult<Json<Value>> {
    registration::finish(
        &state,
        req.account.as_deref(),
        req.challenge_id.as_deref(),
        &req.credential,
    )
    .await?;

    Ok(Json(json!({ "ok": true })))
}

// Authentication endpoints

pub async fn authenticate_start(
    State(state): State<AppState>,
    Json(req): Json<BeginRequest>,
) -> AppResult<Json<Value>> {
    let (challenge_id, options) = authentication::begin(&state, req.account.as_deref()).await?;

    Ok(Json(json!({
        "challengeId": challenge_id,
        "publicKey": options,
    })))
}

pub async fn authenticate_finish(
    session: Session,
    State(state): State<AppState>,
    Json(req): Json<AuthenticationFinishRequest>,
) -> AppResult<Json<Value>> {
    let account = authentication::finish(
        &state,
        req.account.as_deref(),
        &req.challenge_id,
        &req.credential,
    )
    .await?;

    // Ceremony succeeded; issue the session.
    session
        .insert(SESSION_ACCOUNT_KEY, &account)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {}", e)))?;

    Ok(Json(json!({
        "ok": true,
        "account": account,
    })))
}

pub async fn logout(session: Session) -> AppResult<Json<Value>> {
    session
        .delete()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {}", e)))?;

    Ok(Json(json!({ "ok": true })))
}

pub async fn session_info(session: Session) -> AppResult<Json<Value>> {
    let account: Option<String> = session
        .get(SESSION_ACCOUNT_KEY)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {}", e)))?;

    match account {
        Some(account) => Ok(Json(json!({
            "authenticated": true,
            "account": account,
        }))),
        None => Ok(Json(json!({ "authenticated": false }))),
    }
}
