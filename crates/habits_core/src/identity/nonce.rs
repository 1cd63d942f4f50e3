//! Sign-in nonce generation.
//!
//! The raw nonce stays on device; only its SHA-256 hex digest is sent with
//! the sign-in request, and the provider checks the token against it.

use rand::RngCore;
use sha2::{Digest, Sha256};

pub const DEFAULT_NONCE_LEN: usize = 32;

const NONCE_CHARSET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVXYZabcdefghijklmnopqrstuvwxyz-._";

/// Random nonce of `len` characters drawn uniformly from `NONCE_CHARSET`.
///
/// The charset has 64 symbols, so `byte % 64` carries no modulo bias.
pub fn random_nonce(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
        .into_iter()
        .map(|byte| char::from(NONCE_CHARSET[usize::from(byte) % NONCE_CHARSET.len()]))
        .collect()
}

/// Lowercase hex SHA-256 digest of `input`.
pub fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{random_nonce, sha256_hex, DEFAULT_NONCE_LEN, NONCE_CHARSET};

    #[test]
    fn nonce_has_requested_length_and_charset() {
        let nonce = random_nonce(DEFAULT_NONCE_LEN);
        assert_eq!(nonce.len(), DEFAULT_NONCE_LEN);
        assert!(nonce.bytes().all(|byte| NONCE_CHARSET.contains(&byte)));
    }

    #[test]
    fn nonces_differ_between_calls() {
        assert_ne!(random_nonce(32), random_nonce(32));
    }

    #[test]
    fn sha256_matches_known_digest() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
