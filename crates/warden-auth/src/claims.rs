// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Claim-token payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purpose of a claim token. Access and refresh tokens are signed with
/// disjoint secrets; the claim is a second, independent check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived bearer credential presented on every call.
    Access,
    /// Long-lived credential exchangeable once for a new pair.
    Refresh,
}

impl TokenType {
    /// Returns the claim value as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Claims carried by every WARDEN token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id as a UUID string.
    pub sub: String,

    /// Email of the subject at mint time.
    pub email: String,

    /// Token purpose.
    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Rotation family, stable across refreshes of one login.
    pub family: Uuid,

    /// Unique token id.
    pub jti: Uuid,

    /// Issued-at (Unix timestamp).
    pub iat: i64,

    /// Expiry (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Parses the subject into a user id.
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }

    /// Returns the expiry as a timestamp, when representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_serialization() {
        assert_eq!(serde_json::to_string(&TokenType::Access).unwrap(), "\"access\"");
        assert_eq!(serde_json::to_string(&TokenType::Refresh).unwrap(), "\"refresh\"");
    }

    #[test]
    fn test_claims_roundtrip() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "a@x.io".to_string(),
            token_type: TokenType::Access,
            family: Uuid::new_v4(),
            jti: Uuid::new_v4(),
            iat: 1_700_000_000,
            exp: 1_700_000_900,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"type\":\"access\""));

        let parsed: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sub, claims.sub);
        assert!(parsed.user_id().is_ok());
    }

    #[test]
    fn test_bad_subject_fails_to_parse() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            email: String::new(),
            token_type: TokenType::Access,
            family: Uuid::new_v4(),
            jti: Uuid::new_v4(),
            iat: 0,
            exp: 0,
        };
        assert!(claims.user_id().is_err());
    }
}
