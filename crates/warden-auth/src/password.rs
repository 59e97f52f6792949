// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Password hashing.
//!
//! Argon2id with a per-record random salt. A single verification costs
//! tens of milliseconds; call sites on the async path offload through
//! `tokio::task::spawn_blocking`.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use warden_core::{Error, Result};

/// Hashes a password with Argon2id and a fresh random salt.
///
/// The output is a self-describing PHC string carrying algorithm,
/// parameters, and salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| Error::internal("password hashing failed"))
}

/// Verifies a password against a stored digest.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, and an error only
/// when the stored digest itself is malformed.
pub fn verify_password(password: &str, digest: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(digest).map_err(|_| Error::internal("stored password digest invalid"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let digest = hash_password("P@ssword!").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(verify_password("P@ssword!", &digest).unwrap());
        assert!(!verify_password("wrong", &digest).unwrap());
    }

    #[test]
    fn test_salts_differ_per_record() {
        let d1 = hash_password("same").unwrap();
        let d2 = hash_password("same").unwrap();
        assert_ne!(d1, d2);
    }

    #[test]
    fn test_malformed_digest_is_an_error() {
        assert!(verify_password("x", "not-a-digest").is_err());
    }
}
