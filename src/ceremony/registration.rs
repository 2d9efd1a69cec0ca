//! # Registration Ceremony
//!
//! Adds a new credential to an account: `begin` issues a one-time challenge
//! and builds creation options with the account's existing credentials as an
//! exclusion list; `finish` consumes the challenge, delegates verification,
//! canonicalizes the extracted credential material, and persists it.
//!
//! Nothing is stored on any failure path, and a consumed challenge is never
//! restored — a failed registration restarts from `begin`.

use crate::ceremony::types::{
    AuthenticatorSelection, CreationOptions, CredentialDescriptor, CredentialParameter, RpEntity,
    UserEntity,
};
use crate::ceremony::CEREMONY_TIMEOUT_MS;
use crate::db::models::{Challenge, ChallengePurpose};
use crate::db::{challenges, credentials};
use crate::encoding;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::verify::es256::COSE_ALG_ES256;
use crate::verify::{self, AttestationResponse, Expected};

/// Begin registration: returns the challenge id (for `finish`) and the
/// options the client feeds to `navigator.credentials.create()`.
pub async fn begin(state: &AppState, account: Option<&str>) -> AppResult<(String, CreationOptions)> {
    let account = state.accounts.resolve(account)?;

    // Exclusion list: lets the authenticator refuse to re-register a device
    // that already holds a credential for this account.
    let exclude = credentials::list_ids(&state.db, &account).await?;
    let challenge =
        challenges::issue(&state.db, ChallengePurpose::Register, state.challenge_ttl).await?;

    tracing::debug!(
        account = %account,
        challenge = %challenge.id,
        excluded = exclude.len(),
        "issued registration challenge"
    );

    let options = CreationOptions {
        rp: RpEntity {
            id: state.rp.id.clone(),
            name: state.rp.name.clone(),
        },
        user: UserEntity {
            id: encoding::to_canonical(account.as_bytes()),
            name: account.clone(),
            display_name: account,
        },
        challenge: encoding::to_canonical(&challenge.value),
        pub_key_cred_params: vec![CredentialParameter {
            ty: "public-key",
            alg: COSE_ALG_ES256,
        }],
        timeout: CEREMONY_TIMEOUT_MS,
        exclude_credentials: exclude
            .into_iter()
            .map(CredentialDescriptor::public_key)
            .collect(),
        authenticator_selection: AuthenticatorSelection {
            resident_key: "preferred",
            user_verification: "preferred",
        },
        attestation: "none",
    };

    Ok((challenge.id, options))
}

/// Finish registration. Returns the canonical id of the stored credential.
pub async fn finish(
    state: &AppState,
    account: Option<&str>,
    challenge_id: Option<&str>,
    response: &AttestationResponse,
) -> AppResult<String> {
    let account = state.accounts.resolve(account)?;
    let challenge = resolve_challenge(state, challenge_id, response).await?;

    let expected = Expected {
        challenge: challenge.value,
        origin: state.rp.origin.clone(),
        rp_id: state.rp.id.clone(),
    };
    let verification = state.verifier.verify_registration(response, &expected)?;

    let credential_id = encoding::to_canonical(&verification.credential_id);
    if credential_id.is_empty() {
        return Err(AppError::EncodingInvalid("empty credential id".into()));
    }

    credentials::upsert(
        &state.db,
        &account,
        &credential_id,
        &verification.public_key,
        verification.sign_count,
    )
    .await?;

    tracing::info!(account = %account, credential = %credential_id, "registered credential");
    Ok(credential_id)
}

/// Two ordered resolution strategies: the unguessable challenge id first,
/// then — only when the id is missing or unknown — the challenge value the
/// client embedded in its signed payload, restricted to register-purpose
/// challenges.
async fn resolve_challenge(
    state: &AppState,
    challenge_id: Option<&str>,
    response: &AttestationResponse,
) -> AppResult<Challenge> {
    if let Some(id) = challenge_id {
        if let Some(challenge) = challenges::consume_by_id(&state.db, id).await? {
            return match challenge.purpose() {
                Some(ChallengePurpose::Register) => Ok(challenge),
                _ => Err(AppError::ChallengePurposeMismatch),
            };
        }
    }

    let value = verify::embedded_challenge(&response.response.client_data_json)?;
    challenges::consume_by_value(&state.db, ChallengePurpose::Register, &value)
        .await?
        .ok_or(AppError::ChallengeNotFound)
}
