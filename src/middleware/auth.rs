use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

use crate::error::AppError;
use crate::handlers::auth::SESSION_ACCOUNT_KEY;

/// Rejects requests without an authenticated session. Routes behind this
/// layer can assume the session holds an account.
pub async fn require_auth(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let account: Option<String> = session
        .get(SESSION_ACCOUNT_KEY)
        .await
        .map_err(|e| AppError::Internal(format!("Session error: {}", e)))?;

    match account {
        Some(_) => Ok(next.run(request).await),
        None => Err(AppError::Unauthorized("Not authenticated".to_string())),
    }
}
