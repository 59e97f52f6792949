// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Wire response shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_auth::TokenPair;
use warden_core::{User, UserStatus};

// =============================================================================
// User body
// =============================================================================

/// Public view of a user. Never carries the password digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBody {
    /// User id.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Whether the email has been verified.
    pub email_verified: bool,
    /// Account status.
    pub status: UserStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar: user.avatar,
            email_verified: user.email_verified,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

// =============================================================================
// Token pair body
// =============================================================================

/// A minted token pair as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairBody {
    /// Signed access token.
    pub access_token: String,
    /// Signed refresh token.
    pub refresh_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
}

impl From<TokenPair> for TokenPairBody {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access,
            refresh_token: pair.refresh,
            access_expires_at: pair.access_expires_at,
            refresh_expires_at: pair.refresh_expires_at,
        }
    }
}

// =============================================================================
// Auth responses
// =============================================================================

/// Response of register, login, and OAuth callback.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The authenticated user.
    pub user: UserBody,
    /// Freshly minted tokens.
    pub tokens: TokenPairBody,
    /// Set on OAuth callbacks: whether the user was just created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_user: Option<bool>,
}

impl AuthResponse {
    /// Creates a response without the new-user marker.
    pub fn new(user: User, tokens: TokenPair) -> Self {
        Self {
            user: user.into(),
            tokens: tokens.into(),
            is_new_user: None,
        }
    }

    /// Marks whether the OAuth callback created the user.
    pub fn with_is_new_user(mut self, is_new_user: bool) -> Self {
        self.is_new_user = Some(is_new_user);
        self
    }
}

/// Response of the refresh endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// The rotated token pair.
    pub tokens: TokenPairBody,
}

/// Response of the OAuth URL endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthUrlResponse {
    /// The consent URL to redirect the user to.
    pub authorization_url: String,
    /// State token the caller must echo back on callback.
    pub state: String,
}

// =============================================================================
// Generic acknowledgement
// =============================================================================

/// Acknowledgement body for operations with no payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    /// Always `true`.
    pub success: bool,
}

impl Ack {
    /// The success acknowledgement.
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_body_hides_digest() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.io".to_string(),
            name: "A".to_string(),
            avatar: None,
            email_verified: true,
            status: UserStatus::Active,
            password_digest: Some("$argon2id$secret".to_string()),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&UserBody::from(user)).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("a@x.io"));
    }

    #[test]
    fn test_ack_shape() {
        let json = serde_json::to_string(&Ack::ok()).unwrap();
        assert_eq!(json, "{\"success\":true}");
    }
}
