use crate::error::{BenchError, Result};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of an image's encoded bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..12])
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Fingerprint raw image content. Any byte difference, re-encoding included, yields a
/// different fingerprint.
pub fn fingerprint(image_bytes: &[u8]) -> Result<Fingerprint> {
    if image_bytes.is_empty() {
        return Err(BenchError::InvalidImage("image payload is empty".into()));
    }

    let digest = Sha256::digest(image_bytes);
    Ok(Fingerprint(digest.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let bytes = b"\xFF\xD8\xFF\xE0 fake jpeg body".to_vec();
        assert_eq!(fingerprint(&bytes).unwrap(), fingerprint(&bytes.clone()).unwrap());
    }

    #[test]
    fn test_fingerprint_known_value() {
        assert_eq!(
            fingerprint(b"abc").unwrap().to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_distinct_inputs_do_not_collide() {
        let mut seen = HashSet::new();
        for i in 0u32..10_000 {
            let mut bytes = vec![0u8; 64];
            bytes[..4].copy_from_slice(&i.to_le_bytes());
            assert!(seen.insert(fingerprint(&bytes).unwrap()), "collision at {}", i);
        }
    }

    #[test]
    fn test_single_byte_difference_changes_fingerprint() {
        let original = vec![7u8; 4096];
        let mut reencoded = original.clone();
        reencoded[4095] = 8;
        assert_ne!(fingerprint(&original).unwrap(), fingerprint(&reencoded).unwrap());
    }

    #[test]
    fn test_empty_input_is_invalid() {
        assert!(matches!(fingerprint(&[]), Err(BenchError::InvalidImage(_))));
    }

    #[test]
    fn test_fingerprint_serializes_as_hex() {
        let fp = fingerprint(b"abc").unwrap();
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp));
    }
}
