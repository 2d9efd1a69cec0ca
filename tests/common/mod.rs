//! Shared fixtures for integration tests: an in-memory application state
//! wired to the production ES256 verifier, and a simulated authenticator that
//! emits genuine WebAuthn payloads signed with a real P-256 key.

use std::sync::Arc;

use ciborium::Value;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePoolOptions;

use passkey_gate::accounts::AccountRegistry;
use passkey_gate::ceremony::RelyingParty;
use passkey_gate::encoding::{self, WireBytes};
use passkey_gate::state::AppState;
use passkey_gate::verify::es256::Es256Verifier;
use passkey_gate::verify::{
    AssertionPayload, AssertionResponse, AttestationPayload, AttestationResponse,
};

pub const ACCOUNT: &str = "admin@example.com";
pub const RP_ID: &str = "localhost";
pub const ORIGIN: &str = "http://localhost:8080";

const FLAG_UP: u8 = 0x01;
const FLAG_UV: u8 = 0x04;
const FLAG_AT: u8 = 0x40;

pub async fn test_state() -> AppState {
    // One connection only: each SQLite in-memory connection is its own
    // database, so a larger pool would scatter the tables.
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&db).await.unwrap();

    AppState {
        db,
        rp: RelyingParty {
            id: RP_ID.to_string(),
            name: "Passkey Gate".to_string(),
            origin: ORIGIN.to_string(),
        },
        accounts: Arc::new(AccountRegistry::new(vec![ACCOUNT.to_string()])),
        verifier: Arc::new(Es256Verifier),
        challenge_ttl: chrono::Duration::seconds(300),
    }
}

/// A software authenticator holding one resident credential. Produces the
/// same payload shapes a browser hands back from `navigator.credentials`.
pub struct SoftAuthenticator {
    key: SigningKey,
    pub credential_id: Vec<u8>,
}

impl SoftAuthenticator {
    pub fn new() -> Self {
        Self {
            key: SigningKey::random(&mut OsRng),
            credential_id: b"soft-authenticator-credential".to_vec(),
        }
    }

    /// Response to a creation ceremony: attestationObject with fmt "none"
    /// and the credential's COSE key in the attested credential data.
    pub fn attest(&self, challenge_canonical: &str) -> AttestationResponse {
        let client_data = self.client_data("webauthn.create", challenge_canonical, ORIGIN);

        let mut auth_data = self.auth_data_header(FLAG_UP | FLAG_UV | FLAG_AT, 0);
        auth_data.extend_from_slice(&[0u8; 16]); // aaguid
        auth_data.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
        auth_data.extend_from_slice(&self.credential_id);
        ciborium::into_writer(&self.cose_key(), &mut auth_data).unwrap();

        let attestation = Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text("none".into())),
            (Value::Text("attStmt".into()), Value::Map(vec![])),
            (Value::Text("authData".into()), Value::Bytes(auth_data)),
        ]);
        let mut attestation_object = Vec::new();
        ciborium::into_writer(&attestation, &mut attestation_object).unwrap();

        AttestationResponse {
            raw_id: WireBytes::from(self.credential_id.as_slice()),
            response: AttestationPayload {
                client_data_json: encoding::to_canonical(&client_data),
                attestation_object: encoding::to_canonical(&attestation_object),
            },
            ty: Some("public-key".to_string()),
        }
    }

    /// Response to a get ceremony, asserting the given signature counter.
    pub fn assertion(&self, challenge_canonical: &str, counter: u32) -> AssertionResponse {
        self.assertion_from(challenge_canonical, ORIGIN, counter)
    }

    /// Same, but signing over an arbitrary origin (for binding tests).
    pub fn assertion_from(
        &self,
        challenge_canonical: &str,
        origin: &str,
        counter: u32,
    ) -> AssertionResponse {
        let client_data = self.client_data("webauthn.get", challenge_canonical, origin);
        let auth_data = self.auth_data_header(FLAG_UP | FLAG_UV, counter);

        let mut message = auth_data.clone();
        message.extend_from_slice(&Sha256::digest(&client_data));
        let signature: Signature = self.key.sign(&message);

        AssertionResponse {
            raw_id: WireBytes::from(self.credential_id.as_slice()),
            response: AssertionPayload {
                client_data_json: encoding::to_canonical(&client_data),
                authenticator_data: encoding::to_canonical(&auth_data),
                signature: encoding::to_canonical(signature.to_der().as_bytes()),
                user_handle: None,
            },
            ty: Some("public-key".to_string()),
        }
    }

    fn client_data(&self, ty: &str, challenge_canonical: &str, origin: &str) -> Vec<u8> {
        serde_json::json!({
            "type": ty,
            "challenge": challenge_canonical,
            "origin": origin,
        })
        .to_string()
        .into_bytes()
    }

    fn auth_data_header(&self, flags: u8, counter: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&Sha256::digest(RP_ID.as_bytes()));
        bytes.push(flags);
        bytes.extend_from_slice(&counter.to_be_bytes());
        bytes
    }

    fn cose_key(&self) -> Value {
        let point = self.key.verifying_key().to_encoded_point(false);
        let bytes = point.as_bytes();
        Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(2.into())),
            (Value::Integer(3.into()), Value::Integer((-7).into())),
            (Value::Integer((-1).into()), Value::Integer(1.into())),
            (Value::Integer((-2).into()), Value::Bytes(bytes[1..33].to_vec())),
            (Value::Integer((-3).into()), Value::Bytes(bytes[33..65].to_vec())),
        ])
    }
}
