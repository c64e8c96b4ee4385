use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// The size of a refresh token in bytes, before encoding.
const REFRESH_TOKEN_SIZE: usize = 32;

/// Generates a new opaque refresh token.
///
/// # Returns
///
/// A URL-safe base64-encoded token with 256 bits of entropy.
pub fn generate_refresh_token() -> String {
    let mut token = [0u8; REFRESH_TOKEN_SIZE];
    OsRng.fill_bytes(&mut token);

    general_purpose::URL_SAFE_NO_PAD.encode(token)
}

/// Hashes a refresh token for storage and lookup.
///
/// SHA-256, lowercase hex. Deterministic and unsalted: refresh tokens are
/// high-entropy secrets, not passwords, so the digest is usable as a unique
/// lookup key and the plaintext never has to be stored.
pub fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_refresh_token("tok-A"), hash_refresh_token("tok-A"));
    }

    #[test]
    fn hash_is_hex_sha256() {
        let digest = hash_refresh_token("abc");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        // Known SHA-256 vector.
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn different_tokens_hash_differently() {
        assert_ne!(hash_refresh_token("tok-A"), hash_refresh_token("tok-B"));
    }

    #[test]
    fn generated_tokens_are_unique_and_url_safe() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        // 32 bytes => 43 base64 chars without padding.
        assert_eq!(a.len(), 43);
    }
}
