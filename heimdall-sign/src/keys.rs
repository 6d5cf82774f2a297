//! Key loading and the six signing algorithms CycloneDX 1.6 signatures
//! support (§4.5.1 `SigningConfig.algorithm`).

use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, Ed25519KeyPair, RsaKeyPair};

use crate::errors::SignError;
use crate::pem;

/// A signing algorithm identifier, matching the CycloneDX `signature`
/// block's `algorithm` field exactly (§4.5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    Rs256,
    Rs384,
    Rs512,
    Es256,
    Es384,
    Es512,
    Ed25519,
}

impl SigningAlgorithm {
    /// Parses the exact CycloneDX algorithm tag.
    pub fn parse(tag: &str) -> Result<Self, SignError> {
        match tag {
            "RS256" => Ok(Self::Rs256),
            "RS384" => Ok(Self::Rs384),
            "RS512" => Ok(Self::Rs512),
            "ES256" => Ok(Self::Es256),
            "ES384" => Ok(Self::Es384),
            "ES512" => Ok(Self::Es512),
            "Ed25519" => Ok(Self::Ed25519),
            other => Err(SignError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// The exact string written into the `signature.algorithm` field.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
            Self::Es256 => "ES256",
            Self::Es384 => "ES384",
            Self::Es512 => "ES512",
            Self::Ed25519 => "Ed25519",
        }
    }

    /// Digest algorithm implied by this signing algorithm (§4.5.1 step 4).
    /// Ed25519 signs the message directly; it has no separate digest step.
    fn digest_name(self) -> &'static str {
        match self {
            Self::Rs256 | Self::Es256 => "SHA-256",
            Self::Rs384 | Self::Es384 => "SHA-384",
            Self::Rs512 | Self::Es512 => "SHA-512",
            Self::Ed25519 => "none",
        }
    }

    /// The PKCS8 AlgorithmIdentifier OID (and, for EC keys, curve OID)
    /// bytes a correctly paired private key must contain, used by
    /// [`check_key_family`] to produce `AlgorithmKeyMismatch` instead of
    /// an opaque parse failure.
    fn expected_key_oids(self) -> &'static [&'static [u8]] {
        const RSA_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];
        const EC_OID: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
        const P256_OID: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
        const P384_OID: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x22];
        const ED25519_OID: &[u8] = &[0x2b, 0x65, 0x70];

        match self {
            Self::Rs256 | Self::Rs384 | Self::Rs512 => &[RSA_OID],
            Self::Es256 => &[EC_OID, P256_OID],
            Self::Es384 => &[EC_OID, P384_OID],
            Self::Es512 => &[], // ring has no P-521 support; rejected in `sign`
            Self::Ed25519 => &[ED25519_OID],
        }
    }
}

/// A best-effort sniff of a PKCS8 `PrivateKeyInfo`'s `AlgorithmIdentifier`
/// OID(s), since `ring` itself does not expose key introspection.
///
/// This is a substring search over the known, fixed-length DER OID
/// encodings rather than a full ASN.1 parse — sufficient to catch the
/// common mismatch case (e.g. an RSA key supplied for `ES256`) without a
/// dependency on a general DER/ASN.1 crate for two OID lookups.
fn check_key_family(algorithm: SigningAlgorithm, der: &[u8]) -> Result<(), SignError> {
    let expected = algorithm.expected_key_oids();
    if expected.is_empty() {
        return Err(SignError::UnsupportedAlgorithm(format!(
            "{} (no P-521 support available)",
            algorithm.tag()
        )));
    }
    let matches_all = expected.iter().all(|oid| contains_subslice(der, oid));
    if matches_all {
        return Ok(());
    }
    Err(SignError::AlgorithmKeyMismatch {
        algorithm: algorithm.tag().to_string(),
    })
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// An owned, algorithm-matched private key ready to sign.
pub enum PrivateKey {
    Rsa(Box<RsaKeyPair>),
    Ecdsa(Box<EcdsaKeyPair>),
    Ed25519(Box<Ed25519KeyPair>),
}

/// Loads a PEM or DER-encoded PKCS8 private key, verifying its key family
/// matches `algorithm` (§4.5.1 `KeyLoadFailed`/`AlgorithmKeyMismatch`).
pub fn load_private_key(algorithm: SigningAlgorithm, pem_or_der: &str) -> Result<PrivateKey, SignError> {
    let der = pem::pem_to_der(pem_or_der)?;
    check_key_family(algorithm, &der)?;

    match algorithm {
        SigningAlgorithm::Rs256 | SigningAlgorithm::Rs384 | SigningAlgorithm::Rs512 => {
            let pair = RsaKeyPair::from_pkcs8(&der)
                .map_err(|e| SignError::KeyLoadFailed(e.to_string()))?;
            Ok(PrivateKey::Rsa(Box::new(pair)))
        }
        SigningAlgorithm::Es256 => {
            let rng = SystemRandom::new();
            let pair = EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P256_SHA256_FIXED_SIGNING, &der, &rng)
                .map_err(|e| SignError::KeyLoadFailed(e.to_string()))?;
            Ok(PrivateKey::Ecdsa(Box::new(pair)))
        }
        SigningAlgorithm::Es384 => {
            let rng = SystemRandom::new();
            let pair = EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P384_SHA384_FIXED_SIGNING, &der, &rng)
                .map_err(|e| SignError::KeyLoadFailed(e.to_string()))?;
            Ok(PrivateKey::Ecdsa(Box::new(pair)))
        }
        SigningAlgorithm::Es512 => Err(SignError::UnsupportedAlgorithm(
            "ES512 (P-521) is not supported by the underlying crypto library".to_string(),
        )),
        SigningAlgorithm::Ed25519 => {
            let pair =
                Ed25519KeyPair::from_pkcs8(&der).map_err(|e| SignError::KeyLoadFailed(e.to_string()))?;
            Ok(PrivateKey::Ed25519(Box::new(pair)))
        }
    }
}

/// Signs `message` (the canonical JCS bytes) with `key`.
pub fn sign_message(algorithm: SigningAlgorithm, key: &PrivateKey, message: &[u8]) -> Result<Vec<u8>, SignError> {
    let rng = SystemRandom::new();
    match (algorithm, key) {
        (SigningAlgorithm::Rs256, PrivateKey::Rsa(pair)) => rsa_sign(pair, &signature::RSA_PKCS1_SHA256, message, &rng),
        (SigningAlgorithm::Rs384, PrivateKey::Rsa(pair)) => rsa_sign(pair, &signature::RSA_PKCS1_SHA384, message, &rng),
        (SigningAlgorithm::Rs512, PrivateKey::Rsa(pair)) => rsa_sign(pair, &signature::RSA_PKCS1_SHA512, message, &rng),
        (SigningAlgorithm::Es256, PrivateKey::Ecdsa(pair)) | (SigningAlgorithm::Es384, PrivateKey::Ecdsa(pair)) => {
            pair.sign(&rng, message)
                .map(|sig| sig.as_ref().to_vec())
                .map_err(|_| SignError::SignFailed)
        }
        (SigningAlgorithm::Ed25519, PrivateKey::Ed25519(pair)) => Ok(pair.sign(message).as_ref().to_vec()),
        _ => Err(SignError::SignFailed),
    }
}

fn rsa_sign(
    pair: &RsaKeyPair,
    padding: &'static dyn signature::RsaEncoding,
    message: &[u8],
    rng: &SystemRandom,
) -> Result<Vec<u8>, SignError> {
    let mut sig = vec![0u8; pair.public_modulus_len()];
    pair.sign(padding, rng, message, &mut sig)
        .map_err(|_| SignError::SignFailed)?;
    Ok(sig)
}

/// Verifies `signature_bytes` over `message` using a DER/PEM SPKI public
/// key (§4.5.1 "Verification is the inverse").
pub fn verify_message(
    algorithm: SigningAlgorithm,
    public_key_pem_or_der: &str,
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, SignError> {
    let der = pem::pem_to_der(public_key_pem_or_der)?;
    let raw_key = spki_public_key_bytes(&der)?;
    let verify_alg: &dyn signature::VerificationAlgorithm = match algorithm {
        SigningAlgorithm::Rs256 => &signature::RSA_PKCS1_2048_8192_SHA256,
        SigningAlgorithm::Rs384 => &signature::RSA_PKCS1_2048_8192_SHA384,
        SigningAlgorithm::Rs512 => &signature::RSA_PKCS1_2048_8192_SHA512,
        // Matches the FIXED (r||s concatenation, not ASN.1 DER) signing
        // variant used in `sign_message`, the conventional JOSE/JWS
        // ES256/ES384 wire format.
        SigningAlgorithm::Es256 => &signature::ECDSA_P256_SHA256_FIXED,
        SigningAlgorithm::Es384 => &signature::ECDSA_P384_SHA384_FIXED,
        SigningAlgorithm::Es512 => {
            return Err(SignError::UnsupportedAlgorithm("ES512".to_string()))
        }
        SigningAlgorithm::Ed25519 => &signature::ED25519,
    };

    let public_key = signature::UnparsedPublicKey::new(verify_alg, raw_key.as_slice());
    Ok(public_key.verify(message, signature_bytes).is_ok())
}

/// Extracts the raw key bytes `ring` expects (PKCS1 `RSAPublicKey` DER for
/// RSA, the uncompressed SEC1 point for EC, the 32-byte value for
/// Ed25519) out of an X.509 `SubjectPublicKeyInfo` DER blob.
///
/// For every one of those key types the SPKI `BIT STRING` payload already
/// *is* the exact byte string `ring` wants, so this only needs to walk
/// the outer `SEQUENCE { AlgorithmIdentifier, BIT STRING }` shape rather
/// than decode the algorithm-specific content itself.
fn spki_public_key_bytes(der: &[u8]) -> Result<Vec<u8>, SignError> {
    let (outer_tag, outer_start, outer_len, _) = read_tlv(der, 0)?;
    if outer_tag != 0x30 {
        return Err(SignError::KeyLoadFailed("SPKI: expected outer SEQUENCE".to_string()));
    }
    let outer = &der[outer_start..outer_start + outer_len];

    let (alg_tag, _, _, after_alg) = read_tlv(outer, 0)?;
    if alg_tag != 0x30 {
        return Err(SignError::KeyLoadFailed("SPKI: expected AlgorithmIdentifier SEQUENCE".to_string()));
    }

    let (bits_tag, bits_start, bits_len, _) = read_tlv(outer, after_alg)?;
    if bits_tag != 0x03 {
        return Err(SignError::KeyLoadFailed("SPKI: expected BIT STRING".to_string()));
    }
    let bit_string = &outer[bits_start..bits_start + bits_len];
    let unused_bits = *bit_string
        .first()
        .ok_or_else(|| SignError::KeyLoadFailed("SPKI: empty BIT STRING".to_string()))?;
    if unused_bits != 0 {
        return Err(SignError::KeyLoadFailed("SPKI: non-byte-aligned BIT STRING".to_string()));
    }
    Ok(bit_string[1..].to_vec())
}

/// Reads one DER tag-length-value header at `pos`, returning
/// `(tag, content_start, content_len, offset_of_next_tlv)`.
fn read_tlv(data: &[u8], pos: usize) -> Result<(u8, usize, usize, usize), SignError> {
    let bad = || SignError::KeyLoadFailed("malformed DER".to_string());
    let tag = *data.get(pos).ok_or_else(bad)?;
    let mut idx = pos + 1;
    let first_len_byte = *data.get(idx).ok_or_else(bad)?;
    idx += 1;
    let length = if first_len_byte & 0x80 == 0 {
        first_len_byte as usize
    } else {
        let num_bytes = (first_len_byte & 0x7f) as usize;
        if idx + num_bytes > data.len() {
            return Err(bad());
        }
        let mut len = 0usize;
        for &b in &data[idx..idx + num_bytes] {
            len = (len << 8) | b as usize;
        }
        idx += num_bytes;
        len
    };
    let content_start = idx;
    if content_start + length > data.len() {
        return Err(bad());
    }
    Ok((tag, content_start, length, content_start + length))
}

/// The digest name implied by `algorithm`, exposed for the `Signature`
/// document type without re-matching on the enum elsewhere.
pub fn digest_name(algorithm: SigningAlgorithm) -> &'static str {
    algorithm.digest_name()
}
