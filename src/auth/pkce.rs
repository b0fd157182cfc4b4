//! PKCE and anti-CSRF state generation (RFC 7636)

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngExt;
use sha2::{Digest, Sha256};

/// Generate a PKCE code verifier and its S256 challenge
#[must_use]
pub fn generate_pkce() -> (String, String) {
    // 32 random bytes for the verifier
    let verifier_bytes: [u8; 32] = rand::rng().random();
    let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

    let challenge = challenge_s256(&verifier);
    (verifier, challenge)
}

/// SHA-256 challenge for a verifier, base64url-encoded without padding
#[must_use]
pub fn challenge_s256(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generate a random state parameter for CSRF protection
#[must_use]
pub fn generate_state() -> String {
    let state_bytes: [u8; 16] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(state_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkce_verifier_is_base64url_safe() {
        for _ in 0..10 {
            let (verifier, challenge) = generate_pkce();
            assert!(verifier.len() >= 43);
            assert!(!verifier.contains('+'));
            assert!(!verifier.contains('/'));
            assert!(!verifier.contains('='));
            assert!(!challenge.contains('+'));
            assert!(!challenge.contains('/'));
            assert!(!challenge.contains('='));
        }
    }

    #[test]
    fn pkce_challenge_is_sha256_of_verifier() {
        let (verifier, challenge) = generate_pkce();
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        let expected = URL_SAFE_NO_PAD.encode(hasher.finalize());
        assert_eq!(challenge, expected);
        assert_ne!(verifier, challenge);
    }

    #[test]
    fn pkce_generates_unique_values() {
        let (v1, c1) = generate_pkce();
        let (v2, c2) = generate_pkce();
        assert_ne!(v1, v2, "Two PKCE verifiers should be unique");
        assert_ne!(c1, c2, "Two PKCE challenges should be unique");
    }

    #[test]
    fn state_is_base64url_safe() {
        for _ in 0..10 {
            let state = generate_state();
            assert!(!state.contains('+'));
            assert!(!state.contains('/'));
            assert!(!state.contains('='));
            assert!(!state.is_empty());
        }
    }

    #[test]
    fn state_generates_unique_values() {
        assert_ne!(generate_state(), generate_state());
    }

    #[test]
    fn state_has_sufficient_length() {
        let state = generate_state();
        // 16 random bytes -> 22 base64url chars
        assert!(
            state.len() >= 20,
            "State should be at least 20 chars, got {}",
            state.len()
        );
    }
}
