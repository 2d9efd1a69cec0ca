//! # Ceremony Wire Types
//!
//! Request bodies for the begin/finish endpoints and the credential options
//! structures handed to the client, serialized with the WebAuthn JSON field
//! names (`pubKeyCredParams`, `excludeCredentials`, ...) so they can be fed
//! to `navigator.credentials.create()/get()` unchanged.

use serde::{Deserialize, Serialize};

use crate::verify::{AssertionResponse, AttestationResponse};

// --- Requests ---

/// Body for both `begin` endpoints. The account may be omitted in
/// single-account deployments.
#[derive(Debug, Deserialize)]
pub struct BeginRequest {
    pub account: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationFinishRequest {
    pub account: Option<String>,
    /// Challenge id from `begin`. Optional: when the client flow loses it,
    /// the ceremony falls back to the challenge embedded in the signed
    /// payload.
    #[serde(rename = "challengeId", default)]
    pub challenge_id: Option<String>,
    pub credential: AttestationResponse,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticationFinishRequest {
    pub account: Option<String>,
    #[serde(rename = "challengeId")]
    pub challenge_id: String,
    pub credential: AssertionResponse,
}

// --- Options returned by `begin` ---

#[derive(Debug, Clone, Serialize)]
pub struct RpEntity {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserEntity {
    /// base64url user handle (the account identifier bytes).
    pub id: String,
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialParameter {
    #[serde(rename = "type")]
    pub ty: &'static str,
    pub alg: i64,
}

/// An already-registered credential, listed for exclusion (registration) or
/// allowance (authentication).
#[derive(Debug, Clone, Serialize)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub ty: &'static str,
    /// Canonical base64url credential id.
    pub id: String,
}

impl CredentialDescriptor {
    pub fn public_key(id: String) -> Self {
        Self {
            ty: "public-key",
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatorSelection {
    #[serde(rename = "residentKey")]
    pub resident_key: &'static str,
    #[serde(rename = "userVerification")]
    pub user_verification: &'static str,
}

/// Options for `navigator.credentials.create()`.
#[derive(Debug, Clone, Serialize)]
pub struct CreationOptions {
    pub rp: RpEntity,
    pub user: UserEntity,
    /// base64url challenge value.
    pub challenge: String,
    #[serde(rename = "pubKeyCredParams")]
    pub pub_key_cred_params: Vec<CredentialParameter>,
    pub timeout: u32,
    #[serde(rename = "excludeCredentials")]
    pub exclude_credentials: Vec<CredentialDescriptor>,
    #[serde(rename = "authenticatorSelection")]
    pub authenticator_selection: AuthenticatorSelection,
    /// Always "none": no attestation-chain evaluation, trust on first use.
    pub attestation: &'static str,
}

/// Options for `navigator.credentials.get()`.
#[derive(Debug, Clone, Serialize)]
pub struct RequestOptions {
    /// base64url challenge value.
    pub challenge: String,
    pub timeout: u32,
    #[serde(rename = "rpId")]
    pub rp_id: String,
    #[serde(rename = "allowCredentials")]
    pub allow_credentials: Vec<CredentialDescriptor>,
    #[serde(rename = "userVerification")]
    pub user_verification: &'static str,
}
