//! SHA-256 hashing over raw bytes or canonical JSON.
//!
//! Used to derive the `.dict` content hash the CLI prints under
//! `--print-information` (`kemeny_cli::print_information`) so two runs can
//! be compared without diffing the whole dictionary by eye.

use crate::dictionary::Dictionary;
use crate::IoError;

#[cfg(feature = "hash")]
use digest::Digest;
#[cfg(feature = "hash")]
use sha2::Sha256;

#[cfg(all(feature = "hash", feature = "serde"))]
use crate::canonical_json::to_canonical_bytes;
#[cfg(all(feature = "hash", feature = "serde"))]
use serde::Serialize;

/// Lowercase 64-hex SHA-256 of `bytes`.
#[cfg(feature = "hash")]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

#[cfg(not(feature = "hash"))]
pub fn sha256_hex(_bytes: &[u8]) -> String {
    String::new()
}

/// Streaming SHA-256 over a reader; returns lowercase 64-hex.
#[cfg(feature = "hash")]
pub fn sha256_stream<R: std::io::Read>(reader: &mut R) -> Result<String, IoError> {
    let mut h = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        h.update(&buf[..n]);
    }
    Ok(hex::encode(h.finalize()))
}

#[cfg(not(feature = "hash"))]
pub fn sha256_stream<R: std::io::Read>(_reader: &mut R) -> Result<String, IoError> {
    Err(IoError::Hash("hash feature disabled".into()))
}

/// Hash a file from disk; returns lowercase 64-hex.
#[cfg(feature = "hash")]
pub fn sha256_file<P: AsRef<std::path::Path>>(path: P) -> Result<String, IoError> {
    let mut f = std::fs::File::open(path)?;
    sha256_stream(&mut f)
}

#[cfg(not(feature = "hash"))]
pub fn sha256_file<P: AsRef<std::path::Path>>(_path: P) -> Result<String, IoError> {
    Err(IoError::Hash("hash feature disabled".into()))
}

/// SHA-256 of a value's canonical JSON representation.
#[cfg(all(feature = "hash", feature = "serde"))]
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, IoError> {
    Ok(sha256_hex(&to_canonical_bytes(value)?))
}

#[cfg(not(all(feature = "hash", feature = "serde")))]
pub fn sha256_canonical<T>(_value: &T) -> Result<String, IoError> {
    Err(IoError::Hash("hash+serde features required".into()))
}

/// True iff `s` is lowercase 64-hex.
pub fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Lowercase 64-hex SHA-256 of the same bytes `RunArtifacts::write_dict`
/// persists to the `.dict` sidecar, so the hash printed under
/// `--print-information` genuinely identifies that file's content.
#[cfg(feature = "hash")]
pub fn dict_content_hash(dictionary: &Dictionary) -> Result<String, IoError> {
    #[cfg(feature = "serde")]
    {
        Ok(sha256_hex(&to_canonical_bytes(dictionary.names())?))
    }
    #[cfg(not(feature = "serde"))]
    {
        Ok(sha256_hex(dictionary.names().join("\n").as_bytes()))
    }
}

#[cfg(not(feature = "hash"))]
pub fn dict_content_hash(_dictionary: &Dictionary) -> Result<String, IoError> {
    Err(IoError::Hash("hash feature disabled".into()))
}

#[cfg(test)]
#[cfg(feature = "hash")]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_digest() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn is_hex64_rejects_uppercase_and_wrong_length() {
        assert!(is_hex64(&"a".repeat(64)));
        assert!(!is_hex64(&"A".repeat(64)));
        assert!(!is_hex64(&"a".repeat(63)));
    }

    #[test]
    fn dict_content_hash_is_stable_and_order_sensitive() {
        let mut a = Dictionary::new();
        a.intern("Amy");
        a.intern("Zed");

        let mut b = Dictionary::new();
        b.intern("Zed");
        b.intern("Amy");

        let hash_a = dict_content_hash(&a).unwrap();
        let hash_b = dict_content_hash(&b).unwrap();
        assert!(is_hex64(&hash_a));
        assert_ne!(hash_a, hash_b, "interning order changes the persisted bytes");
        assert_eq!(hash_a, dict_content_hash(&a).unwrap());
    }
}
