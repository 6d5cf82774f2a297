//! Streaming SHA-1/SHA-256 checksums.
//!
//! Binary Object Readers (§4.1) must never load an entire file into memory
//! just to hash it, so hashing goes through a small streaming reader rather
//! than `sha2::Sha256::digest(&whole_file)`.

use std::collections::BTreeMap;
use std::io::{self, Read};

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// The checksum algorithms tracked on a [`crate::component::ComponentInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChecksumAlgorithm {
    Sha1,
    Sha256,
}

impl ChecksumAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha1 => "SHA1",
            ChecksumAlgorithm::Sha256 => "SHA256",
        }
    }
}

/// A map of algorithm to lowercase hex digest, as stored on `ComponentInfo`.
pub type ChecksumMap = BTreeMap<ChecksumAlgorithm, String>;

/// Streams `reader` once, computing SHA-256 always and SHA-1 additionally
/// (§4.1: "Checksum: SHA-256 always, SHA-1 additionally").
///
/// Never buffers more than [`BUF_SIZE`] bytes regardless of input size.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<ChecksumMap> {
    const BUF_SIZE: usize = 64 * 1024;

    let mut sha1 = Sha1::new();
    let mut sha256 = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sha1.update(&buf[..n]);
        sha256.update(&buf[..n]);
    }

    let mut map = ChecksumMap::new();
    map.insert(ChecksumAlgorithm::Sha1, hex::encode(sha1.finalize()));
    map.insert(ChecksumAlgorithm::Sha256, hex::encode(sha256.finalize()));
    Ok(map)
}

/// Hashes an in-memory buffer. Convenience wrapper around [`hash_reader`]
/// for archive members and other data already resident in memory.
pub fn hash_bytes(data: &[u8]) -> ChecksumMap {
    hash_reader(data).expect("hashing an in-memory slice cannot fail")
}

/// SHA-256 of `data`, lowercase hex. Used for the content-hash half of
/// `identity_key` (§3 I1).
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// SHA-1 of `data`, lowercase hex. Used by the SPDX 2.3 package
/// verification code (§4.5, P7).
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_bytes_matches_known_vectors() {
        let sums = hash_bytes(b"abc");
        assert_eq!(
            sums[&ChecksumAlgorithm::Sha1],
            "a9993e364706816aba3e25717850c26c9cd0d89"
        );
        assert_eq!(
            sums[&ChecksumAlgorithm::Sha256],
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_hex_is_deterministic() {
        assert_eq!(sha256_hex(b"abc"), sha256_hex(b"abc"));
        assert_ne!(sha256_hex(b"abc"), sha256_hex(b"abd"));
    }
}
