//! # Error Handling
//!
//! One application-wide error enum covering the ceremony failure taxonomy and
//! the infrastructure errors underneath it, plus the conversion into HTTP
//! responses.
//!
//! Protocol failures are deliberately collapsed into a single generic message
//! at the HTTP boundary: distinguishing "no such challenge" from "no such
//! credential" in a response body would hand an unauthenticated caller an
//! enumeration oracle. The specific kind is logged server-side only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::verify::VerifyError;

#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors (SQLx library errors)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The presented challenge id (or embedded challenge value) does not
    /// resolve to an unconsumed challenge. Covers never-issued, already
    /// consumed, and expired challenges alike.
    #[error("challenge not found")]
    ChallengeNotFound,

    /// A challenge issued for one ceremony was presented to the other.
    #[error("challenge purpose mismatch")]
    ChallengePurposeMismatch,

    /// No credential stored under (account, credential id).
    #[error("credential not found")]
    CredentialNotFound,

    /// The verification primitive rejected the attestation or assertion.
    #[error("verification failed: {0}")]
    Verification(#[from] VerifyError),

    /// The signature counter went backwards relative to the stored row at
    /// write time. Strong signal of a cloned authenticator.
    #[error("signature counter regression")]
    CounterRegression,

    /// A byte-like wire value could not be canonicalized.
    #[error("invalid encoding: {0}")]
    EncodingInvalid(String),

    /// The deployment has no account registered that could satisfy the
    /// request. Also returned for accounts outside the registry, so callers
    /// cannot probe which accounts are provisioned.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Client sent a structurally invalid request (400)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No valid session (401)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Unexpected internal errors (500)
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable tag for internal diagnostics. Never echoed to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database",
            AppError::Serialization(_) => "serialization",
            AppError::ChallengeNotFound => "challenge_not_found",
            AppError::ChallengePurposeMismatch => "challenge_purpose_mismatch",
            AppError::CredentialNotFound => "credential_not_found",
            AppError::Verification(_) => "verification_failed",
            AppError::CounterRegression => "counter_regression",
            AppError::EncodingInvalid(_) => "encoding_invalid",
            AppError::ConfigurationMissing(_) => "configuration_missing",
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Internal(_) => "internal",
        }
    }

    /// Ceremony failures that must all present the same face to the caller.
    fn is_ceremony_failure(&self) -> bool {
        matches!(
            self,
            AppError::ChallengeNotFound
                | AppError::ChallengePurposeMismatch
                | AppError::CredentialNotFound
                | AppError::Verification(_)
                | AppError::CounterRegression
                | AppError::EncodingInvalid(_)
                | AppError::ConfigurationMissing(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = if self.is_ceremony_failure() {
            // Full detail goes to the log; the wire gets one generic message.
            tracing::warn!(kind = self.kind(), error = %self, "ceremony failure");
            (StatusCode::BAD_REQUEST, "verification failed".to_string())
        } else {
            match &self {
                AppError::Database(e) => {
                    tracing::error!("database error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
                }
                AppError::Serialization(e) => {
                    tracing::error!("serialization error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
                }
                AppError::Internal(e) => {
                    tracing::error!("internal error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
                }
                AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
                AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
                // Covered by is_ceremony_failure above.
                _ => (StatusCode::BAD_REQUEST, "verification failed".to_string()),
            }
        };

        let body = Json(json!({
            "ok": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
