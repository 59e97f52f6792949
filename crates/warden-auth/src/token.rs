// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Opaque token generation and storage digests.
//!
//! Opaque tokens back API keys, service keys, and OAuth state. They are
//! never stored in plaintext; the SHA-256 hex digest is the sole persisted
//! representation and the lookup key. The preimage is high-entropy, so the
//! digest is unsalted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use warden_core::{Error, Result};

/// Default opaque token length in raw bytes.
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// Generates a cryptographically random, URL-safe base64 token.
///
/// Output length is deterministic in `byte_len`: `ceil(byte_len * 4 / 3)`
/// characters, unpadded.
pub fn generate_token(byte_len: usize) -> Result<String> {
    if byte_len == 0 {
        return Err(Error::invalid_argument("token length must be non-zero"));
    }
    let mut bytes = vec![0u8; byte_len];
    OsRng.fill_bytes(&mut bytes);
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Computes the storage digest of a token: lowercase SHA-256 hex over the
/// raw token string.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns the display prefix of a freshly minted key: its first 8 chars.
pub fn key_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_deterministic() {
        let t = generate_token(DEFAULT_TOKEN_BYTES).unwrap();
        // 32 bytes -> 43 base64url chars without padding.
        assert_eq!(t.len(), 43);

        let t = generate_token(16).unwrap();
        assert_eq!(t.len(), 22);
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(generate_token(0).is_err());
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_token(32).unwrap();
        let b = generate_token(32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_shape_and_stability() {
        let digest = token_digest("example-token");

        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(digest, token_digest("example-token"));
        assert_ne!(digest, token_digest("other-token"));
    }

    #[test]
    fn test_key_prefix() {
        assert_eq!(key_prefix("abcdefghijkl"), "abcdefgh");
    }
}
