// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Claim-token manager.
//!
//! Mints and verifies HS256 access/refresh pairs. The two purposes use
//! disjoint secrets as a hard invariant: an access token presented as
//! refresh fails the signature check before the `type` claim is even
//! consulted, and vice versa.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_core::{Error, Result};

use crate::claims::{Claims, TokenType};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the token manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenManagerConfig {
    /// Secret for access tokens.
    #[serde(skip_serializing)]
    pub access_secret: String,
    /// Secret for refresh tokens. Must differ from `access_secret`.
    #[serde(skip_serializing)]
    pub refresh_secret: String,
    /// Access token lifetime in seconds.
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_ttl_secs: i64,
    /// Clock-skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for TokenManagerConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(), // Must be set by the operator
            refresh_secret: String::new(),
            access_ttl_secs: 900,         // 15 minutes
            refresh_ttl_secs: 604_800,    // 7 days
            leeway_secs: 0,
        }
    }
}

impl TokenManagerConfig {
    /// Creates a configuration from the two secrets, with default TTLs.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            ..Default::default()
        }
    }

    /// Sets the access token lifetime.
    pub fn with_access_ttl_secs(mut self, secs: i64) -> Self {
        self.access_ttl_secs = secs;
        self
    }

    /// Sets the refresh token lifetime.
    pub fn with_refresh_ttl_secs(mut self, secs: i64) -> Self {
        self.refresh_ttl_secs = secs;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err(Error::internal("token secrets are not configured"));
        }
        if self.access_secret == self.refresh_secret {
            return Err(Error::internal(
                "access and refresh secrets must be distinct",
            ));
        }
        if self.access_secret.len() < 32 || self.refresh_secret.len() < 32 {
            tracing::warn!("token secret is shorter than recommended (32 bytes)");
        }
        Ok(())
    }
}

// =============================================================================
// TokenPair
// =============================================================================

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Signed access token.
    pub access: String,
    /// Signed refresh token.
    pub refresh: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
    /// Rotation family both tokens belong to.
    pub family_id: Uuid,
}

// =============================================================================
// TokenManager
// =============================================================================

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Mints and verifies claim tokens.
#[derive(Clone)]
pub struct TokenManager {
    config: Arc<TokenManagerConfig>,
    access: Arc<Keys>,
    refresh: Arc<Keys>,
    validation: Arc<Validation>,
}

impl TokenManager {
    /// Creates a new token manager from configuration.
    pub fn new(config: TokenManagerConfig) -> Result<Self> {
        config.validate()?;

        let access = Keys {
            encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
        };
        let refresh = Keys {
            encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
        };

        // Explicit algorithm allowlist; a token whose header claims any
        // other algorithm fails before signature verification.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        validation.validate_aud = false;

        Ok(Self {
            config: Arc::new(config),
            access: Arc::new(access),
            refresh: Arc::new(refresh),
            validation: Arc::new(validation),
        })
    }

    /// Mints a token pair for a user.
    ///
    /// An absent `family` starts a new rotation family; refresh rotation
    /// passes the existing family through.
    pub fn mint(&self, user_id: Uuid, email: &str, family: Option<Uuid>) -> Result<TokenPair> {
        let family_id = family.unwrap_or_else(Uuid::new_v4);
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.config.access_ttl_secs);
        let refresh_exp = now + Duration::seconds(self.config.refresh_ttl_secs);

        let access_claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            token_type: TokenType::Access,
            family: family_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
        };
        let refresh_claims = Claims {
            token_type: TokenType::Refresh,
            jti: Uuid::new_v4(),
            exp: refresh_exp.timestamp(),
            ..access_claims.clone()
        };

        let header = Header::new(Algorithm::HS256);
        let access = encode(&header, &access_claims, &self.access.encoding)
            .map_err(|_| Error::internal("failed to sign access token"))?;
        let refresh = encode(&header, &refresh_claims, &self.refresh.encoding)
            .map_err(|_| Error::internal("failed to sign refresh token"))?;

        Ok(TokenPair {
            access,
            refresh,
            access_expires_at: access_exp,
            refresh_expires_at: refresh_exp,
            family_id,
        })
    }

    /// Verifies a token for the expected purpose and returns its claims.
    ///
    /// Rejects non-HS256 headers, expired tokens (distinct error message),
    /// bad signatures, and type-claim mismatches.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let keys = match expected {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        };

        let data = decode::<Claims>(token, &keys.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Error::unauthenticated("token expired")
                }
                _ => Error::unauthenticated("invalid token"),
            }
        })?;

        if data.claims.token_type != expected {
            return Err(Error::unauthenticated("wrong token type"));
        }

        Ok(data.claims)
    }

    /// Returns the access token lifetime in seconds.
    pub fn access_ttl_secs(&self) -> i64 {
        self.config.access_ttl_secs
    }

    /// Returns the refresh token lifetime in seconds.
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.config.refresh_ttl_secs
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("access_ttl_secs", &self.config.access_ttl_secs)
            .field("refresh_ttl_secs", &self.config.refresh_ttl_secs)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_manager() -> TokenManager {
        TokenManager::new(TokenManagerConfig::new(
            "access-secret-long-enough-for-testing-00",
            "refresh-secret-long-enough-for-testing-0",
        ))
        .unwrap()
    }

    #[test]
    fn test_mint_and_verify_roundtrip() {
        let manager = test_manager();
        let user_id = Uuid::new_v4();
        let family = Uuid::new_v4();

        let pair = manager.mint(user_id, "a@x.io", Some(family)).unwrap();

        let claims = manager.verify(&pair.refresh, TokenType::Refresh).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "a@x.io");
        assert_eq!(claims.family, family);
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(pair.family_id, family);

        let claims = manager.verify(&pair.access, TokenType::Access).unwrap();
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_fresh_family_when_absent() {
        let manager = test_manager();
        let p1 = manager.mint(Uuid::new_v4(), "a@x.io", None).unwrap();
        let p2 = manager.mint(Uuid::new_v4(), "a@x.io", None).unwrap();
        assert_ne!(p1.family_id, p2.family_id);
    }

    #[test]
    fn test_cross_purpose_rejected_by_secret() {
        let manager = test_manager();
        let pair = manager.mint(Uuid::new_v4(), "a@x.io", None).unwrap();

        // Disjoint secrets: the signature check alone rejects these.
        assert!(manager.verify(&pair.access, TokenType::Refresh).is_err());
        assert!(manager.verify(&pair.refresh, TokenType::Access).is_err());
    }

    #[test]
    fn test_type_claim_checked_even_with_shared_secret() {
        let manager = test_manager();
        let pair = manager.mint(Uuid::new_v4(), "a@x.io", None).unwrap();

        // A second manager whose *access* secret equals the first's
        // refresh secret: the signature passes, the type claim must not.
        let crossed = TokenManager::new(TokenManagerConfig::new(
            "refresh-secret-long-enough-for-testing-0",
            "another-secret-long-enough-for-testing-0",
        ))
        .unwrap();

        let err = crossed.verify(&pair.refresh, TokenType::Access).unwrap_err();
        assert_eq!(err.to_string(), "wrong token type");
    }

    #[test]
    fn test_expired_token_distinct_error() {
        let manager = TokenManager::new(
            TokenManagerConfig::new(
                "access-secret-long-enough-for-testing-00",
                "refresh-secret-long-enough-for-testing-0",
            )
            .with_access_ttl_secs(-3600),
        )
        .unwrap();

        let pair = manager.mint(Uuid::new_v4(), "a@x.io", None).unwrap();
        let err = manager.verify(&pair.access, TokenType::Access).unwrap_err();
        assert_eq!(err.to_string(), "token expired");
    }

    #[test]
    fn test_garbage_token_rejected() {
        let manager = test_manager();
        assert!(manager.verify("not.a.token", TokenType::Access).is_err());
    }

    #[test]
    fn test_equal_secrets_rejected_at_construction() {
        let config = TokenManagerConfig::new("same-secret", "same-secret");
        assert!(TokenManager::new(config).is_err());
    }
}
