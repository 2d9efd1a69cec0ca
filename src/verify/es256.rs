//! # ES256 Verification Primitive
//!
//! Production [`CeremonyVerifier`]: parses WebAuthn attestation and assertion
//! payloads, checks the challenge/origin/RP-id binding in the collected
//! client data, and verifies ECDSA P-256 assertion signatures.
//!
//! The attestation trust policy is "none" (trust-on-first-use): registration
//! performs the binding and structure checks and extracts the credential key,
//! but never evaluates an attestation certificate chain. Only COSE ES256
//! (alg -7) keys are accepted — the same single algorithm the ceremony
//! options advertise.

use ciborium::Value;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use sha2::{Digest, Sha256};

use super::{
    parse_client_data, AssertionResponse, AttestationResponse, AuthenticationVerification,
    CeremonyVerifier, Expected, RegistrationVerification, VerifyError,
};
use crate::encoding;

/// Authenticator data flag bits (WebAuthn §6.1).
const FLAG_USER_PRESENT: u8 = 0x01;
const FLAG_ATTESTED_CREDENTIAL_DATA: u8 = 0x40;

/// COSE algorithm identifier for ECDSA P-256 with SHA-256.
pub const COSE_ALG_ES256: i64 = -7;

pub struct Es256Verifier;

impl CeremonyVerifier for Es256Verifier {
    fn verify_registration(
        &self,
        response: &AttestationResponse,
        expected: &Expected,
    ) -> Result<RegistrationVerification, VerifyError> {
        check_client_data(
            &response.response.client_data_json,
            "webauthn.create",
            expected,
        )?;

        let attestation_object = encoding::decode_text(&response.response.attestation_object)
            .map_err(|_| VerifyError::Malformed("attestationObject encoding"))?;
        let auth_data_bytes = attestation_auth_data(&attestation_object)?;
        let auth_data = AuthenticatorData::parse(&auth_data_bytes)?;

        check_rp_binding(&auth_data, expected)?;
        if auth_data.flags & FLAG_ATTESTED_CREDENTIAL_DATA == 0 {
            return Err(VerifyError::Malformed("missing attested credential data"));
        }
        let attested = auth_data
            .attested
            .ok_or(VerifyError::Malformed("missing attested credential data"))?;

        let public_key = cose_to_sec1(&attested.cose_key)?;

        Ok(RegistrationVerification {
            credential_id: attested.credential_id,
            public_key,
            sign_count: auth_data.sign_count,
        })
    }

    fn verify_authentication(
        &self,
        response: &AssertionResponse,
        expected: &Expected,
        stored_public_key: &[u8],
        _stored_sign_count: u32,
    ) -> Result<AuthenticationVerification, VerifyError> {
        let (_, client_data_raw) = check_client_data(
            &response.response.client_data_json,
            "webauthn.get",
            expected,
        )?;

        let auth_data_bytes = encoding::decode_text(&response.response.authenticator_data)
            .map_err(|_| VerifyError::Malformed("authenticatorData encoding"))?;
        let auth_data = AuthenticatorData::parse(&auth_data_bytes)?;
        check_rp_binding(&auth_data, expected)?;

        let signature_der = encoding::decode_text(&response.response.signature)
            .map_err(|_| VerifyError::Malformed("signature encoding"))?;
        let signature = Signature::from_der(&signature_der)
            .map_err(|_| VerifyError::Malformed("signature"))?;
        let verifying_key = VerifyingKey::from_sec1_bytes(stored_public_key)
            .map_err(|_| VerifyError::Malformed("stored public key"))?;

        // The authenticator signs authenticatorData || SHA-256(clientDataJSON).
        let mut message = auth_data_bytes.clone();
        message.extend_from_slice(&Sha256::digest(&client_data_raw));

        verifying_key
            .verify(&message, &signature)
            .map_err(|_| VerifyError::BadSignature)?;

        Ok(AuthenticationVerification {
            sign_count: auth_data.sign_count,
        })
    }
}

/// Parse clientDataJSON and enforce the ceremony binding: type, challenge,
/// origin. Returns the parsed form plus raw bytes for the signature base.
fn check_client_data(
    client_data_json: &str,
    expected_type: &str,
    expected: &Expected,
) -> Result<(super::ClientData, Vec<u8>), VerifyError> {
    let (client_data, raw) = parse_client_data(client_data_json)?;

    if client_data.ceremony_type != expected_type {
        return Err(VerifyError::TypeMismatch);
    }
    let signed_challenge = encoding::decode_text(&client_data.challenge)
        .map_err(|_| VerifyError::Malformed("challenge encoding"))?;
    if signed_challenge != expected.challenge {
        return Err(VerifyError::ChallengeMismatch);
    }
    if client_data.origin != expected.origin {
        return Err(VerifyError::OriginMismatch);
    }

    Ok((client_data, raw))
}

fn check_rp_binding(auth_data: &AuthenticatorData, expected: &Expected) -> Result<(), VerifyError> {
    let expected_hash = Sha256::digest(expected.rp_id.as_bytes());
    if auth_data.rp_id_hash != expected_hash.as_slice() {
        return Err(VerifyError::RpIdMismatch);
    }
    if auth_data.flags & FLAG_USER_PRESENT == 0 {
        return Err(VerifyError::UserNotPresent);
    }
    Ok(())
}

/// Pull the `authData` bytes out of a CBOR attestation object. The `fmt` and
/// `attStmt` fields are ignored under the "none" trust policy.
fn attestation_auth_data(attestation_object: &[u8]) -> Result<Vec<u8>, VerifyError> {
    let value: Value = ciborium::from_reader(attestation_object)
        .map_err(|_| VerifyError::Malformed("attestationObject"))?;
    let entries = value
        .as_map()
        .ok_or(VerifyError::Malformed("attestationObject"))?;

    for (key, val) in entries {
        if key.as_text() == Some("authData") {
            return val
                .as_bytes()
                .cloned()
                .ok_or(VerifyError::Malformed("authData"));
        }
    }
    Err(VerifyError::Malformed("authData"))
}

struct AuthenticatorData {
    rp_id_hash: [u8; 32],
    flags: u8,
    sign_count: u32,
    attested: Option<AttestedCredential>,
}

struct AttestedCredential {
    credential_id: Vec<u8>,
    cose_key: Value,
}

impl AuthenticatorData {
    /// Layout: rpIdHash(32) || flags(1) || signCount(4) || attested
    /// credential data when the AT flag is set (aaguid(16) || credIdLen(2) ||
    /// credId || COSE key, CBOR).
    fn parse(bytes: &[u8]) -> Result<Self, VerifyError> {
        if bytes.len() < 37 {
            return Err(VerifyError::Malformed("authenticator data"));
        }
        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(&bytes[..32]);
        let flags = bytes[32];
        let sign_count = u32::from_be_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]);

        let attested = if flags & FLAG_ATTESTED_CREDENTIAL_DATA != 0 {
            if bytes.len() < 55 {
                return Err(VerifyError::Malformed("attested credential data"));
            }
            let id_len = usize::from(u16::from_be_bytes([bytes[53], bytes[54]]));
            let id_end = 55 + id_len;
            if bytes.len() < id_end {
                return Err(VerifyError::Malformed("credential id"));
            }
            let credential_id = bytes[55..id_end].to_vec();
            let cose_key: Value = ciborium::from_reader(&bytes[id_end..])
                .map_err(|_| VerifyError::Malformed("credential public key"))?;
            Some(AttestedCredential {
                credential_id,
                cose_key,
            })
        } else {
            None
        };

        Ok(Self {
            rp_id_hash,
            flags,
            sign_count,
            attested,
        })
    }
}

/// Convert a COSE EC2 P-256 key to an uncompressed SEC1 point, the form the
/// credential store persists and `p256` verifies against.
fn cose_to_sec1(cose_key: &Value) -> Result<Vec<u8>, VerifyError> {
    let entries = cose_key.as_map().ok_or(VerifyError::Malformed("COSE key"))?;

    let label_int = |label: i64| -> Option<i128> {
        entries.iter().find_map(|(k, v)| {
            (k.as_integer().map(i128::from) == Some(i128::from(label)))
                .then(|| v.as_integer().map(i128::from))
                .flatten()
        })
    };
    let label_bytes = |label: i64| -> Option<&Vec<u8>> {
        entries.iter().find_map(|(k, v)| {
            (k.as_integer().map(i128::from) == Some(i128::from(label)))
                .then(|| v.as_bytes())
                .flatten()
        })
    };

    // kty 2 (EC2), alg -7 (ES256), crv 1 (P-256).
    if label_int(1) != Some(2) {
        return Err(VerifyError::UnsupportedAlgorithm);
    }
    if label_int(3) != Some(i128::from(COSE_ALG_ES256)) {
        return Err(VerifyError::UnsupportedAlgorithm);
    }
    if label_int(-1) != Some(1) {
        return Err(VerifyError::UnsupportedAlgorithm);
    }

    let x = label_bytes(-2).ok_or(VerifyError::Malformed("COSE key"))?;
    let y = label_bytes(-3).ok_or(VerifyError::Malformed("COSE key"))?;
    if x.len() != 32 || y.len() != 32 {
        return Err(VerifyError::Malformed("COSE key"));
    }

    let mut sec1 = Vec::with_capacity(65);
    sec1.push(0x04);
    sec1.extend_from_slice(x);
    sec1.extend_from_slice(y);

    // Reject points not on the curve up front rather than at first use.
    VerifyingKey::from_sec1_bytes(&sec1).map_err(|_| VerifyError::Malformed("COSE key"))?;

    Ok(sec1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::SigningKey;
    use rand::rngs::OsRng;

    fn test_cose_key(signing_key: &SigningKey) -> Value {
        let point = signing_key.verifying_key().to_encoded_point(false);
        let bytes = point.as_bytes();
        Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(2.into())),
            (Value::Integer(3.into()), Value::Integer((-7).into())),
            (Value::Integer((-1).into()), Value::Integer(1.into())),
            (Value::Integer((-2).into()), Value::Bytes(bytes[1..33].to_vec())),
            (Value::Integer((-3).into()), Value::Bytes(bytes[33..65].to_vec())),
        ])
    }

    #[test]
    fn cose_ec2_key_converts_to_the_sec1_point() {
        let signing_key = SigningKey::random(&mut OsRng);
        let sec1 = cose_to_sec1(&test_cose_key(&signing_key)).unwrap();
        assert_eq!(
            sec1,
            signing_key.verifying_key().to_encoded_point(false).as_bytes()
        );
    }

    #[test]
    fn non_es256_cose_keys_are_unsupported() {
        let signing_key = SigningKey::random(&mut OsRng);
        let mut entries = match test_cose_key(&signing_key) {
            Value::Map(entries) => entries,
            _ => unreachable!(),
        };
        // alg -257 (RS256)
        entries[1].1 = Value::Integer((-257).into());
        assert!(matches!(
            cose_to_sec1(&Value::Map(entries)),
            Err(VerifyError::UnsupportedAlgorithm)
        ));
    }

    #[test]
    fn authenticator_data_parses_header_and_counter() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&Sha256::digest(b"admin.example.com"));
        bytes.push(FLAG_USER_PRESENT);
        bytes.extend_from_slice(&42u32.to_be_bytes());

        let parsed = AuthenticatorData::parse(&bytes).unwrap();
        assert_eq!(parsed.sign_count, 42);
        assert_eq!(parsed.flags, FLAG_USER_PRESENT);
        assert!(parsed.attested.is_none());

        assert!(AuthenticatorData::parse(&bytes[..36]).is_err());
    }

    #[test]
    fn attested_credential_data_yields_id_and_key() {
        let signing_key = SigningKey::random(&mut OsRng);
        let credential_id = vec![0xaa; 16];

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&Sha256::digest(b"admin.example.com"));
        bytes.push(FLAG_USER_PRESENT | FLAG_ATTESTED_CREDENTIAL_DATA);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 16]); // aaguid
        bytes.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&credential_id);
        ciborium::into_writer(&test_cose_key(&signing_key), &mut bytes).unwrap();

        let parsed = AuthenticatorData::parse(&bytes).unwrap();
        let attested = parsed.attested.unwrap();
        assert_eq!(attested.credential_id, credential_id);
        assert!(cose_to_sec1(&attested.cose_key).is_ok());
    }

    #[test]
    fn client_data_binding_is_enforced() {
        let challenge = vec![7u8; 32];
        let expected = Expected {
            challenge: challenge.clone(),
            origin: "https://admin.example.com".to_string(),
            rp_id: "admin.example.com".to_string(),
        };
        let payload = |ty: &str, challenge: &[u8], origin: &str| {
            let json = serde_json::json!({
                "type": ty,
                "challenge": encoding::to_canonical(challenge),
                "origin": origin,
            });
            encoding::to_canonical(json.to_string().as_bytes())
        };

        let good = payload("webauthn.get", &challenge, "https://admin.example.com");
        assert!(check_client_data(&good, "webauthn.get", &expected).is_ok());

        let wrong_type = payload("webauthn.create", &challenge, "https://admin.example.com");
        assert!(matches!(
            check_client_data(&wrong_type, "webauthn.get", &expected),
            Err(VerifyError::TypeMismatch)
        ));

        let wrong_challenge = payload("webauthn.get", &[9u8; 32], "https://admin.example.com");
        assert!(matches!(
            check_client_data(&wrong_challenge, "webauthn.get", &expected),
            Err(VerifyError::ChallengeMismatch)
        ));

        let wrong_origin = payload("webauthn.get", &challenge, "https://evil.example.com");
        assert!(matches!(
            check_client_data(&wrong_origin, "webauthn.get", &expected),
            Err(VerifyError::OriginMismatch)
        ));
    }
}
