//! # Authentication Ceremony
//!
//! Verifies a login attempt against a stored credential: `begin` issues a
//! login challenge with the account's credentials as the allow-list; `finish`
//! consumes the challenge, verifies the assertion, and advances the signature
//! counter under the non-regression rule.
//!
//! A counter that moves backwards is treated as a cloned or replayed
//! authenticator and rejects the ceremony without touching storage.

use crate::ceremony::types::{CredentialDescriptor, RequestOptions};
use crate::ceremony::CEREMONY_TIMEOUT_MS;
use crate::db::models::ChallengePurpose;
use crate::db::{challenges, credentials};
use crate::encoding;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::verify::{AssertionResponse, Expected};

/// Begin authentication: returns the challenge id and the options the client
/// feeds to `navigator.credentials.get()`.
///
/// An account with no credentials still gets valid options — the empty
/// allow-list just means no device can satisfy the ceremony.
pub async fn begin(state: &AppState, account: Option<&str>) -> AppResult<(String, RequestOptions)> {
    let account = state.accounts.resolve(account)?;

    let allow = credentials::list_ids(&state.db, &account).await?;
    let challenge =
        challenges::issue(&state.db, ChallengePurpose::Login, state.challenge_ttl).await?;

    tracing::debug!(
        account = %account,
        challenge = %challenge.id,
        allowed = allow.len(),
        "issued authentication challenge"
    );

    let options = RequestOptions {
        challenge: encoding::to_canonical(&challenge.value),
        timeout: CEREMONY_TIMEOUT_MS,
        rp_id: state.rp.id.clone(),
        allow_credentials: allow
            .into_iter()
            .map(CredentialDescriptor::public_key)
            .collect(),
        user_verification: "preferred",
    };

    Ok((challenge.id, options))
}

/// Finish authentication. Returns the authenticated account; the caller is
/// responsible for turning that into a session.
pub async fn finish(
    state: &AppState,
    account: Option<&str>,
    challenge_id: &str,
    response: &AssertionResponse,
) -> AppResult<String> {
    let account = state.accounts.resolve(account)?;

    let challenge = challenges::consume_by_id(&state.db, challenge_id)
        .await?
        .ok_or(AppError::ChallengeNotFound)?;
    if challenge.purpose() != Some(ChallengePurpose::Login) {
        return Err(AppError::ChallengePurposeMismatch);
    }

    let credential_id = encoding::canonicalize(&response.raw_id)?;
    let stored = credentials::find(&state.db, &account, &credential_id)
        .await?
        .ok_or(AppError::CredentialNotFound)?;
    let stored_count = u32::try_from(stored.sign_count)
        .map_err(|_| AppError::Internal("stored counter out of range".into()))?;

    let expected = Expected {
        challenge: challenge.value,
        origin: state.rp.origin.clone(),
        rp_id: state.rp.id.clone(),
    };
    let verification = state.verifier.verify_authentication(
        response,
        &expected,
        &stored.public_key,
        stored_count,
    )?;

    // Non-regression check happens inside the conditional write, against the
    // row value visible at write time — not the one read above.
    let updated = credentials::update_counter(
        &state.db,
        &account,
        &credential_id,
        verification.sign_count,
    )
    .await?;
    if !updated {
        return Err(AppError::CounterRegression);
    }

    tracing::info!(account = %account, credential = %credential_id, "authenticated");
    Ok(account)
}
