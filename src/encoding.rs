//! # Encoding Normalization
//!
//! Byte-like values cross this service's wire and storage boundaries in
//! several shapes: unpadded base64url (the WebAuthn JSON convention), padded
//! standard base64, `\x`-prefixed hex (the escape form some storage drivers
//! emit for binary columns), and length-prefixed numeric arrays. Credential
//! ids are used as lookup keys, so every one of those shapes must collapse to
//! a single canonical form before it touches the database.
//!
//! The canonical persistence and comparison form is unpadded base64url.
//! Anything this module does not positively recognize is rejected with
//! `EncodingInvalid` rather than decoded on a best-effort basis; a silently
//! mis-decoded credential id would be a corrupted lookup key.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A byte-like value as it may arrive in a wire payload.
///
/// Raw in-process byte slices are already in canonical input form and go
/// straight through [`to_canonical`]; this enum covers the JSON-borne shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireBytes {
    /// base64url (unpadded), padded base64, or `\x`-prefixed hex.
    Text(String),
    /// Length-prefixed numeric array: first element is the byte count.
    Array(Vec<u64>),
}

impl From<&[u8]> for WireBytes {
    fn from(bytes: &[u8]) -> Self {
        WireBytes::Text(to_canonical(bytes))
    }
}

/// Decode any supported representation to raw bytes.
pub fn to_bytes(value: &WireBytes) -> AppResult<Vec<u8>> {
    match value {
        WireBytes::Text(s) => decode_text(s),
        WireBytes::Array(items) => decode_array(items),
    }
}

/// Decode a textual byte representation.
///
/// Dispatch is on shape, not fallback order: a `\x` prefix means hex, the
/// presence of `+`, `/` or `=` means padded/standard base64, and everything
/// else must be clean unpadded base64url.
pub fn decode_text(s: &str) -> AppResult<Vec<u8>> {
    if let Some(hex_digits) = s.strip_prefix("\\x") {
        return hex::decode(hex_digits)
            .map_err(|_| AppError::EncodingInvalid(format!("bad hex string ({} chars)", s.len())));
    }
    if s.contains(['+', '/', '=']) {
        return BASE64_STANDARD
            .decode(s)
            .map_err(|_| AppError::EncodingInvalid(format!("bad base64 string ({} chars)", s.len())));
    }
    BASE64_URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|_| AppError::EncodingInvalid(format!("bad base64url string ({} chars)", s.len())))
}

fn decode_array(items: &[u64]) -> AppResult<Vec<u8>> {
    let (len, body) = match items.split_first() {
        Some((len, body)) => (*len, body),
        None => return Err(AppError::EncodingInvalid("empty numeric array".into())),
    };
    if len as usize != body.len() {
        return Err(AppError::EncodingInvalid(format!(
            "numeric array length prefix {} does not match {} elements",
            len,
            body.len()
        )));
    }
    body.iter()
        .map(|&b| {
            u8::try_from(b).map_err(|_| AppError::EncodingInvalid(format!("array element {b} out of byte range")))
        })
        .collect()
}

/// Canonical string form: unpadded base64url.
pub fn to_canonical(bytes: &[u8]) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Normalize any supported representation to the canonical string.
pub fn canonicalize(value: &WireBytes) -> AppResult<String> {
    Ok(to_canonical(&to_bytes(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = &[0xde, 0xad, 0xbe, 0xef, 0x00, 0x41];

    #[test]
    fn all_representations_map_to_one_canonical_string() {
        let canonical = to_canonical(SAMPLE);
        let representations = [
            WireBytes::Text(canonical.clone()),
            WireBytes::Text(BASE64_STANDARD.encode(SAMPLE)),
            WireBytes::Text(format!("\\x{}", hex::encode(SAMPLE))),
            WireBytes::Array({
                let mut v = vec![SAMPLE.len() as u64];
                v.extend(SAMPLE.iter().map(|&b| u64::from(b)));
                v
            }),
        ];
        for repr in &representations {
            assert_eq!(to_bytes(repr).unwrap(), SAMPLE, "{repr:?}");
            assert_eq!(canonicalize(repr).unwrap(), canonical, "{repr:?}");
        }
    }

    #[test]
    fn canonical_round_trip_is_identity() {
        for bytes in [&b""[..], &b"\x00"[..], &b"\xff\xfe"[..], SAMPLE] {
            let canonical = to_canonical(bytes);
            assert_eq!(decode_text(&canonical).unwrap(), bytes);
        }
    }

    #[test]
    fn canonicalizing_is_idempotent() {
        let once = canonicalize(&WireBytes::Text(BASE64_STANDARD.encode(SAMPLE))).unwrap();
        let twice = canonicalize(&WireBytes::Text(once.clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unrecognized_input_is_rejected_not_guessed() {
        let bad = [
            WireBytes::Text("not base64url!!".into()),
            WireBytes::Text("\\xzz".into()),
            WireBytes::Text("a+b=c/d?".into()),
            WireBytes::Array(vec![3, 1, 2]),       // prefix does not match
            WireBytes::Array(vec![1, 999]),        // element out of byte range
            WireBytes::Array(vec![]),
        ];
        for repr in &bad {
            assert!(
                matches!(to_bytes(repr), Err(AppError::EncodingInvalid(_))),
                "{repr:?} should be EncodingInvalid"
            );
        }
    }

    #[test]
    fn untagged_deserialization_covers_both_shapes() {
        let text: WireBytes = serde_json::from_str("\"3q2-7wBB\"").unwrap();
        assert_eq!(to_bytes(&text).unwrap(), SAMPLE);

        let array: WireBytes = serde_json::from_str("[2, 222, 173]").unwrap();
        assert_eq!(to_bytes(&array).unwrap(), vec![0xde, 0xad]);
    }
}
