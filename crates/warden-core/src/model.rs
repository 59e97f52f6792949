// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Persistent domain records.
//!
//! All records are plain rows: identifiers plus owned data, no back-pointers
//! across aggregates. Relations are resolved by explicit store lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// User
// =============================================================================

/// Account status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Normal account; may authenticate.
    Active,
    /// Deactivated account.
    Inactive,
    /// Banned account; must never authenticate, regardless of scheme.
    Banned,
}

/// A human user.
///
/// `password_digest` is absent for OAuth-only accounts; password login then
/// fails with a typed error rather than a verification failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,
    /// Unique email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL, if any.
    pub avatar: Option<String>,
    /// Whether the email has been verified (provider-asserted for OAuth).
    pub email_verified: bool,
    /// Account status.
    pub status: UserStatus,
    /// Password KDF digest. `None` for OAuth-only accounts.
    #[serde(skip_serializing)]
    pub password_digest: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns `true` if the user may authenticate at all.
    pub fn may_authenticate(&self) -> bool {
        self.status != UserStatus::Banned
    }
}

// =============================================================================
// OAuth account link
// =============================================================================

/// A link between a user and an external OAuth/OIDC identity.
///
/// Unique per `(provider, provider_account_id)` and per `(user_id, provider)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthAccount {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Provider name, e.g. `"google"` or `"github"`.
    pub provider: String,
    /// The subject identifier at the provider.
    pub provider_account_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Session
// =============================================================================

/// A live refresh token, tracked server-side by digest.
///
/// `family_id` links every session descended from a single login; observing
/// a revoked session on refresh triggers family-wide revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// SHA-256 hex digest of the refresh token. Unique among live sessions.
    pub refresh_digest: String,
    /// Rotation family, stable across refreshes.
    pub family_id: Uuid,
    /// Hard expiry; refresh past this point is rejected even if not revoked.
    pub expires_at: DateTime<Utc>,
    /// Whether this session has been consumed or revoked.
    pub revoked: bool,
    /// Client address at creation, advisory.
    pub ip: Option<String>,
    /// Client user agent at creation, advisory.
    pub user_agent: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Returns `true` if the session is past its hard expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

// =============================================================================
// API key
// =============================================================================

/// A long-lived user credential record.
///
/// The plaintext is revealed exactly once at creation; only the digest is
/// stored and lookup is exclusively by digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Human-readable label.
    pub name: String,
    /// First 8 characters of the plaintext, for display.
    pub key_prefix: String,
    /// SHA-256 hex digest of the plaintext. Unique across all records.
    #[serde(skip_serializing)]
    pub key_digest: String,
    /// Scope names granted to the key, if restricted.
    pub scopes: Vec<String>,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the key has been revoked.
    pub revoked: bool,
    /// Last successful authentication with this key, advisory.
    pub last_used_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    /// Returns `true` if the key is past its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }
}

// =============================================================================
// Service account
// =============================================================================

/// Status of a service account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAccountStatus {
    /// May authenticate.
    Active,
    /// Keys are rejected with a permission error.
    Disabled,
}

/// A non-human principal owned by an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccount {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning organization.
    pub org_id: Uuid,
    /// Human-readable label.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Account status.
    pub status: ServiceAccountStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A long-lived service-account credential record. Same shape as [`ApiKey`]
/// but a distinct namespace and store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning service account.
    pub service_account_id: Uuid,
    /// Human-readable label.
    pub name: String,
    /// First 8 characters of the plaintext, for display.
    pub key_prefix: String,
    /// SHA-256 hex digest of the plaintext. Unique across all records.
    #[serde(skip_serializing)]
    pub key_digest: String,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the key has been revoked.
    pub revoked: bool,
    /// Last successful authentication with this key, advisory.
    pub last_used_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ServiceAccountKey {
    /// Returns `true` if the key is past its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }
}

// =============================================================================
// Role & permission
// =============================================================================

/// A role in the hierarchy.
///
/// `org_id = None` marks a system role shared across organizations.
/// Roles form a forest via `parent_role_id`; cycles are rejected at
/// resolution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier.
    pub id: Uuid,
    /// Role name, unique per `(name, org_id)`.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Owning organization; `None` for system roles.
    pub org_id: Option<Uuid>,
    /// Parent role, inherited from during resolution.
    pub parent_role_id: Option<Uuid>,
}

/// A named permission, of the form `resource:action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Unique identifier.
    pub id: Uuid,
    /// Globally unique name, e.g. `"org:read"`.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
}

impl Permission {
    /// Returns `true` if `name` has the `resource:action` form.
    pub fn is_valid_name(name: &str) -> bool {
        let mut parts = name.splitn(2, ':');
        match (parts.next(), parts.next()) {
            (Some(resource), Some(action)) => !resource.is_empty() && !action.is_empty(),
            _ => false,
        }
    }
}

// =============================================================================
// Memberships & bindings
// =============================================================================

/// The role a user carries inside an organization.
/// Unique per `(org_id, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgMember {
    /// Organization.
    pub org_id: Uuid,
    /// Member user.
    pub user_id: Uuid,
    /// Role granted by the membership.
    pub role_id: Uuid,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}

/// The role a user carries inside a team. Unique per `(team_id, user_id)`.
///
/// Team roles are tracked but do not feed permission resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Team.
    pub team_id: Uuid,
    /// Member user.
    pub user_id: Uuid,
    /// Role granted by the membership.
    pub role_id: Uuid,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}

/// A role binding for a service account, scoped to an organization.
/// Unique per `(service_account_id, role_id, org_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaRoleBinding {
    /// Service account.
    pub service_account_id: Uuid,
    /// Bound role.
    pub role_id: Uuid,
    /// Organization scope of the binding.
    pub org_id: Uuid,
    /// When the binding was created.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_banned_user_may_not_authenticate() {
        let mut user = test_user();
        assert!(user.may_authenticate());

        user.status = UserStatus::Banned;
        assert!(!user.may_authenticate());
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            refresh_digest: "d".repeat(64),
            family_id: Uuid::new_v4(),
            expires_at: now - Duration::seconds(1),
            revoked: false,
            ip: None,
            user_agent: None,
            created_at: now - Duration::days(7),
        };

        assert!(session.is_expired(now));
    }

    #[test]
    fn test_api_key_expiry() {
        let now = Utc::now();
        let mut key = ApiKey {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "ci".to_string(),
            key_prefix: "abcd1234".to_string(),
            key_digest: "d".repeat(64),
            scopes: Vec::new(),
            expires_at: None,
            revoked: false,
            last_used_at: None,
            created_at: now,
        };

        assert!(!key.is_expired(now));

        key.expires_at = Some(now - Duration::seconds(1));
        assert!(key.is_expired(now));
    }

    #[test]
    fn test_permission_name_form() {
        assert!(Permission::is_valid_name("org:read"));
        assert!(Permission::is_valid_name("member:invite"));
        assert!(!Permission::is_valid_name("orgread"));
        assert!(!Permission::is_valid_name(":read"));
        assert!(!Permission::is_valid_name("org:"));
        assert!(!Permission::is_valid_name(""));
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "a@x.io".to_string(),
            name: "A".to_string(),
            avatar: None,
            email_verified: false,
            status: UserStatus::Active,
            password_digest: Some("$argon2id$stub".to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}
