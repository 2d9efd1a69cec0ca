//! # Verification Primitive Boundary
//!
//! The ceremonies treat cryptographic verification as a trusted collaborator
//! behind the [`CeremonyVerifier`] trait: hand it the client's signed
//! response plus what the relying party expects the payload to bind to
//! (challenge, origin, RP id), get back the extracted credential material or
//! a failure. The production implementation lives in [`es256`]; tests swap in
//! simulated verifiers.

pub mod es256;

use serde::Deserialize;
use thiserror::Error;

use crate::encoding::{self, WireBytes};

/// Why the verification primitive rejected a response. Internal detail only;
/// at the HTTP boundary every variant collapses into "verification failed".
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed {0}")]
    Malformed(&'static str),
    #[error("ceremony type mismatch")]
    TypeMismatch,
    #[error("challenge mismatch")]
    ChallengeMismatch,
    #[error("origin mismatch")]
    OriginMismatch,
    #[error("relying party id mismatch")]
    RpIdMismatch,
    #[error("user presence not asserted")]
    UserNotPresent,
    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,
    #[error("signature check failed")]
    BadSignature,
}

/// What the relying party expects the signed client payload to bind to.
#[derive(Debug, Clone)]
pub struct Expected {
    pub challenge: Vec<u8>,
    pub origin: String,
    pub rp_id: String,
}

/// Registration ceremony response from `navigator.credentials.create()`.
#[derive(Debug, Clone, Deserialize)]
pub struct AttestationResponse {
    #[serde(rename = "rawId")]
    pub raw_id: WireBytes,
    pub response: AttestationPayload,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttestationPayload {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "attestationObject")]
    pub attestation_object: String,
}

/// Authentication ceremony response from `navigator.credentials.get()`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssertionResponse {
    #[serde(rename = "rawId")]
    pub raw_id: WireBytes,
    pub response: AssertionPayload,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssertionPayload {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: String,
    pub signature: String,
    #[serde(rename = "userHandle", default)]
    pub user_handle: Option<String>,
}

/// Successful registration verification: the material the ceremony persists.
#[derive(Debug, Clone)]
pub struct RegistrationVerification {
    pub credential_id: Vec<u8>,
    pub public_key: Vec<u8>,
    pub sign_count: u32,
}

/// Successful authentication verification.
#[derive(Debug, Clone)]
pub struct AuthenticationVerification {
    pub sign_count: u32,
}

pub trait CeremonyVerifier: Send + Sync {
    fn verify_registration(
        &self,
        response: &AttestationResponse,
        expected: &Expected,
    ) -> Result<RegistrationVerification, VerifyError>;

    fn verify_authentication(
        &self,
        response: &AssertionResponse,
        expected: &Expected,
        stored_public_key: &[u8],
        stored_sign_count: u32,
    ) -> Result<AuthenticationVerification, VerifyError>;
}

/// The collected client data a browser signs over, per the WebAuthn JSON
/// serialization.
#[derive(Debug, Deserialize)]
pub struct ClientData {
    #[serde(rename = "type")]
    pub ceremony_type: String,
    /// base64url-encoded challenge value.
    pub challenge: String,
    pub origin: String,
}

/// Decode and parse a base64url clientDataJSON payload, returning both the
/// parsed form and the raw bytes (the raw bytes feed the signature base).
pub fn parse_client_data(client_data_json: &str) -> Result<(ClientData, Vec<u8>), VerifyError> {
    let raw = encoding::decode_text(client_data_json)
        .map_err(|_| VerifyError::Malformed("clientDataJSON encoding"))?;
    let parsed =
        serde_json::from_slice(&raw).map_err(|_| VerifyError::Malformed("clientDataJSON"))?;
    Ok((parsed, raw))
}

/// The challenge value the client actually signed over, extracted from its
/// clientDataJSON. Used by the registration ceremony's by-value fallback.
pub fn embedded_challenge(client_data_json: &str) -> Result<Vec<u8>, VerifyError> {
    let (client_data, _) = parse_client_data(client_data_json)?;
    encoding::decode_text(&client_data.challenge)
        .map_err(|_| VerifyError::Malformed("challenge encoding"))
}
