//! JSF-style canonicalization and signing for CycloneDX 1.6+ documents
//! (§4.5.1): remove every `signature` field, canonicalize the remainder
//! under RFC 8785 (JCS), sign the canonical bytes, and attach a fresh
//! top-level `signature` block.
//!
//! Library crates here never initialize a global logger or hold process
//! state beyond what `heimdall-dwarf`'s lock requires; signing is a pure
//! function of its inputs.

mod canonical;
mod errors;
mod excludes;
mod keys;
mod pem;

use base64::Engine;
use serde_json::Value;

pub use errors::SignError;
pub use keys::SigningAlgorithm;

/// Input to [`sign`]: the key material and optional identifying fields
/// attached to the resulting `signature` block.
pub struct SigningConfig<'a> {
    pub algorithm: SigningAlgorithm,
    /// PEM or raw-DER PKCS8 private key.
    pub private_key: &'a str,
    pub key_id: Option<String>,
    /// Caller-supplied so repeated runs with a fixed clock reproduce
    /// identical bytes (P3); `None` omits the field entirely.
    pub timestamp: Option<String>,
}

/// The `signature` block CycloneDX 1.6 documents carry (§3 `Signature`).
#[derive(Debug, Clone)]
pub struct Signature {
    pub algorithm: String,
    pub value: String,
    pub key_id: Option<String>,
    pub timestamp: Option<String>,
    pub excludes: Vec<String>,
}

impl Signature {
    fn into_json(self) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("algorithm".to_string(), Value::String(self.algorithm));
        obj.insert("value".to_string(), Value::String(self.value));
        if let Some(key_id) = self.key_id {
            obj.insert("keyId".to_string(), Value::String(key_id));
        }
        if let Some(timestamp) = self.timestamp {
            obj.insert("timestamp".to_string(), Value::String(timestamp));
        }
        obj.insert(
            "excludes".to_string(),
            Value::Array(self.excludes.into_iter().map(Value::String).collect()),
        );
        Value::Object(obj)
    }
}

/// Signs `document_bytes` (a parseable CycloneDX JSON document) per
/// §4.5.1 steps 1-6. Returns the final document bytes with a top-level
/// `signature` field attached; the attachment step itself is not
/// re-canonicalized, matching step 6 exactly.
pub fn sign(document_bytes: &[u8], config: &SigningConfig<'_>) -> Result<Vec<u8>, SignError> {
    let mut document: Value = serde_json::from_slice(document_bytes)?;

    let excludes = excludes::remove_signature_fields(&mut document);
    let canonical_text = canonical::canonicalize(&document);

    let key = keys::load_private_key(config.algorithm, config.private_key)?;
    let raw_signature = keys::sign_message(config.algorithm, &key, canonical_text.as_bytes())?;
    let value = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw_signature);

    let signature = Signature {
        algorithm: config.algorithm.tag().to_string(),
        value,
        key_id: config.key_id.clone(),
        timestamp: config.timestamp.clone(),
        excludes,
    };

    if let Value::Object(map) = &mut document {
        map.insert("signature".to_string(), signature.into_json());
    }

    serde_json::to_vec(&document).map_err(SignError::InvalidDocument)
}

/// Verifies a signed CycloneDX document against `public_key` (§4.5.1
/// "Verification is the inverse"): re-runs the exclude-walk using the
/// stored `excludes`, re-canonicalizes, and checks the signature.
pub fn verify(signed_document_bytes: &[u8], public_key: &str) -> Result<bool, SignError> {
    let mut document: Value = serde_json::from_slice(signed_document_bytes)?;

    let signature_value = document
        .as_object_mut()
        .and_then(|map| map.remove("signature"))
        .ok_or(SignError::MissingSignature)?;

    let algorithm_tag = signature_value
        .get("algorithm")
        .and_then(Value::as_str)
        .ok_or(SignError::SignFailed)?;
    let algorithm = SigningAlgorithm::parse(algorithm_tag)?;
    let encoded_value = signature_value
        .get("value")
        .and_then(Value::as_str)
        .ok_or(SignError::SignFailed)?;
    let raw_signature = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(encoded_value)
        .map_err(|_| SignError::SignFailed)?;

    excludes::remove_signature_fields(&mut document);
    let canonical_text = canonical::canonicalize(&document);

    keys::verify_message(algorithm, public_key, canonical_text.as_bytes(), &raw_signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A 2048-bit RSA PKCS8 test key generated solely for this suite; it
    // signs nothing outside these in-memory fixtures.
    const TEST_RSA_PKCS8_PEM: &str = include_str!("../testdata/rsa2048.pkcs8.pem");
    const TEST_RSA_PUBLIC_PEM: &str = include_str!("../testdata/rsa2048.spki.pem");

    const TEST_ED25519_PKCS8_PEM: &str = include_str!("../testdata/ed25519.pkcs8.pem");
    const TEST_ED25519_PUBLIC_PEM: &str = include_str!("../testdata/ed25519.spki.pem");

    fn sample_document() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.6",
            "components": [{"type": "library", "name": "libfoo", "bom-ref": "libfoo"}],
        }))
        .unwrap()
    }

    #[test]
    fn signs_and_verifies_with_rsa() {
        let doc = sample_document();
        let config = SigningConfig {
            algorithm: SigningAlgorithm::Rs256,
            private_key: TEST_RSA_PKCS8_PEM,
            key_id: Some("key-1".to_string()),
            timestamp: Some("2024-01-01T00:00:00Z".to_string()),
        };
        let signed = sign(&doc, &config).unwrap();

        let parsed: Value = serde_json::from_slice(&signed).unwrap();
        assert_eq!(parsed["signature"]["algorithm"], "RS256");
        assert_eq!(parsed["signature"]["excludes"], serde_json::json!([]));

        assert!(verify(&signed, TEST_RSA_PUBLIC_PEM).unwrap());
    }

    #[test]
    fn signs_and_verifies_with_ed25519() {
        let doc = sample_document();
        let config = SigningConfig {
            algorithm: SigningAlgorithm::Ed25519,
            private_key: TEST_ED25519_PKCS8_PEM,
            key_id: None,
            timestamp: None,
        };
        let signed = sign(&doc, &config).unwrap();
        assert!(verify(&signed, TEST_ED25519_PUBLIC_PEM).unwrap());
    }

    #[test]
    fn one_bit_mutation_fails_verification() {
        let doc = sample_document();
        let config = SigningConfig {
            algorithm: SigningAlgorithm::Rs256,
            private_key: TEST_RSA_PKCS8_PEM,
            key_id: None,
            timestamp: None,
        };
        let mut signed = sign(&doc, &config).unwrap();
        let mutate_at = signed.len() / 2;
        signed[mutate_at] ^= 0x01;

        // A single flipped byte may break JSON parsing outright or merely
        // change the canonical bytes; either way verification must not
        // succeed.
        match verify(&signed, TEST_RSA_PUBLIC_PEM) {
            Ok(valid) => assert!(!valid),
            Err(_) => {}
        }
    }

    #[test]
    fn rejects_mismatched_key_family() {
        let config = SigningConfig {
            algorithm: SigningAlgorithm::Es256,
            private_key: TEST_RSA_PKCS8_PEM,
            key_id: None,
            timestamp: None,
        };
        let err = sign(&sample_document(), &config).unwrap_err();
        assert!(matches!(err, SignError::AlgorithmKeyMismatch { .. }));
    }

    #[test]
    fn rejects_es512_as_unsupported() {
        let config = SigningConfig {
            algorithm: SigningAlgorithm::Es512,
            private_key: TEST_RSA_PKCS8_PEM,
            key_id: None,
            timestamp: None,
        };
        let err = sign(&sample_document(), &config).unwrap_err();
        assert!(matches!(err, SignError::UnsupportedAlgorithm(_)));
    }
}
