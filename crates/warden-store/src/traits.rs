// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Store contracts.
//!
//! One trait per collection, mirroring the relational schema. Backends are
//! free to push operations down (the ancestor walk maps onto a recursive
//! CTE) or iterate in application code, as the in-memory backend does.
//! The service core holds a single `Arc<dyn Store>`.

use async_trait::async_trait;
use uuid::Uuid;

use warden_core::{
    ApiKey, OAuthAccount, OrgMember, Permission, Role, SaRoleBinding, ServiceAccount,
    ServiceAccountKey, ServiceAccountStatus, Session, TeamMember, User,
};

use crate::error::StoreResult;

// =============================================================================
// Users
// =============================================================================

/// Operations on the `users` collection. `email` is unique.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with a conflict on duplicate email.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    /// Fetches a user by id.
    async fn get_user(&self, id: Uuid) -> StoreResult<User>;

    /// Fetches a user by email.
    async fn get_user_by_email(&self, email: &str) -> StoreResult<User>;

    /// Replaces a user row.
    async fn update_user(&self, user: &User) -> StoreResult<()>;

    /// Soft-deletes a user; the row stops matching lookups.
    async fn soft_delete_user(&self, id: Uuid) -> StoreResult<()>;
}

// =============================================================================
// OAuth accounts
// =============================================================================

/// Operations on the `oauth_accounts` collection.
/// Unique per `(provider, provider_account_id)` and `(user_id, provider)`.
#[async_trait]
pub trait OAuthAccountStore: Send + Sync {
    /// Inserts a new account link.
    async fn insert_oauth_account(&self, account: &OAuthAccount) -> StoreResult<()>;

    /// Fetches a link by `(provider, provider_account_id)`.
    async fn get_oauth_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> StoreResult<OAuthAccount>;

    /// Fetches a link by `(user_id, provider)`.
    async fn get_oauth_account_for_user(
        &self,
        user_id: Uuid,
        provider: &str,
    ) -> StoreResult<OAuthAccount>;
}

// =============================================================================
// Sessions
// =============================================================================

/// Operations on the `sessions` collection. `refresh_digest` is unique;
/// `family_id` and `user_id` are indexed for bulk revocation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts a new session. Fails with a conflict on duplicate digest.
    async fn insert_session(&self, session: &Session) -> StoreResult<()>;

    /// Fetches a session by refresh digest, revoked or not.
    async fn get_session_by_digest(&self, digest: &str) -> StoreResult<Session>;

    /// Marks the session with the given digest revoked and returns the
    /// **previous** value of its `revoked` flag, atomically.
    ///
    /// Refresh rotation keys off the previous value: `true` means the
    /// token was already consumed and the family is compromised.
    async fn mark_revoked_by_digest(&self, digest: &str) -> StoreResult<bool>;

    /// Revokes every session in a rotation family. Returns the count.
    async fn mark_revoked_by_family(&self, family_id: Uuid) -> StoreResult<usize>;

    /// Revokes every session belonging to a user. Returns the count.
    async fn mark_revoked_by_user(&self, user_id: Uuid) -> StoreResult<usize>;

    /// Deletes sessions past their hard expiry. Returns the count.
    async fn delete_expired_sessions(&self) -> StoreResult<usize>;
}

// =============================================================================
// API keys
// =============================================================================

/// Operations on the `api_keys` collection. `key_digest` is unique.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Inserts a new key record. Fails with a conflict on duplicate digest.
    async fn insert_api_key(&self, key: &ApiKey) -> StoreResult<()>;

    /// Fetches a key by digest. Revoked keys do not match.
    async fn get_api_key_by_digest(&self, digest: &str) -> StoreResult<ApiKey>;

    /// Fetches a key by id, revoked or not.
    async fn get_api_key(&self, id: Uuid) -> StoreResult<ApiKey>;

    /// Lists keys owned by a user, newest first.
    async fn list_api_keys_by_user(&self, user_id: Uuid) -> StoreResult<Vec<ApiKey>>;

    /// Flips the key's `revoked` flag.
    async fn revoke_api_key(&self, id: Uuid) -> StoreResult<()>;

    /// Updates `last_used_at` to now. Advisory; callers may fire and forget.
    async fn touch_api_key(&self, id: Uuid) -> StoreResult<()>;
}

// =============================================================================
// Service accounts & keys
// =============================================================================

/// Operations on the `service_accounts` collection.
#[async_trait]
pub trait ServiceAccountStore: Send + Sync {
    /// Inserts a new service account.
    async fn insert_service_account(&self, account: &ServiceAccount) -> StoreResult<()>;

    /// Fetches a service account by id.
    async fn get_service_account(&self, id: Uuid) -> StoreResult<ServiceAccount>;

    /// Updates a service account's status.
    async fn set_service_account_status(
        &self,
        id: Uuid,
        status: ServiceAccountStatus,
    ) -> StoreResult<()>;

    /// Lists service accounts belonging to an organization.
    async fn list_service_accounts_by_org(&self, org_id: Uuid) -> StoreResult<Vec<ServiceAccount>>;
}

/// Operations on the `service_account_keys` collection. `key_digest` is unique.
#[async_trait]
pub trait ServiceAccountKeyStore: Send + Sync {
    /// Inserts a new key record. Fails with a conflict on duplicate digest.
    async fn insert_service_account_key(&self, key: &ServiceAccountKey) -> StoreResult<()>;

    /// Fetches a key by digest together with its owning service account.
    /// Revoked keys do not match.
    async fn get_service_account_key_by_digest(
        &self,
        digest: &str,
    ) -> StoreResult<(ServiceAccountKey, ServiceAccount)>;

    /// Lists keys belonging to a service account, newest first.
    async fn list_service_account_keys(
        &self,
        service_account_id: Uuid,
    ) -> StoreResult<Vec<ServiceAccountKey>>;

    /// Flips the key's `revoked` flag.
    async fn revoke_service_account_key(&self, id: Uuid) -> StoreResult<()>;

    /// Updates `last_used_at` to now. Advisory; callers may fire and forget.
    async fn touch_service_account_key(&self, id: Uuid) -> StoreResult<()>;
}

// =============================================================================
// Roles & permissions
// =============================================================================

/// Operations on the `roles` collection. `(name, org_id)` is unique.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Inserts a new role. Fails with a conflict on duplicate `(name, org_id)`.
    async fn insert_role(&self, role: &Role) -> StoreResult<()>;

    /// Fetches a role by id.
    async fn get_role(&self, id: Uuid) -> StoreResult<Role>;

    /// Fetches a role by `(name, org_id)`.
    async fn get_role_by_name(&self, name: &str, org_id: Option<Uuid>) -> StoreResult<Role>;

    /// Returns the role itself and all transitive parents by
    /// `parent_role_id`, stopping at `max_depth` or on an absent parent.
    ///
    /// The starting role is its own depth-1 ancestor. Backends must
    /// terminate on cyclic parent chains; the walk stops when it would
    /// revisit a role already collected.
    async fn get_role_ancestors(&self, role_id: Uuid, max_depth: usize) -> StoreResult<Vec<Role>>;

    /// Lists roles visible in an org scope (system roles included).
    async fn list_roles(&self, org_id: Option<Uuid>) -> StoreResult<Vec<Role>>;
}

/// Operations on the `permissions` collection. `name` is globally unique.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Inserts a new permission. Fails with a conflict on duplicate name.
    async fn insert_permission(&self, permission: &Permission) -> StoreResult<()>;

    /// Fetches a permission by name.
    async fn get_permission_by_name(&self, name: &str) -> StoreResult<Permission>;

    /// Lists all permissions.
    async fn list_permissions(&self) -> StoreResult<Vec<Permission>>;
}

/// Operations on the `role_permissions` assignment set.
#[async_trait]
pub trait RolePermissionStore: Send + Sync {
    /// Assigns a permission to a role. Idempotent.
    async fn assign_permission(&self, role_id: Uuid, permission_id: Uuid) -> StoreResult<()>;

    /// Removes a permission from a role.
    async fn revoke_permission(&self, role_id: Uuid, permission_id: Uuid) -> StoreResult<()>;

    /// Returns the distinct permissions attached to any of the given roles.
    async fn permissions_for_role_ids(&self, role_ids: &[Uuid]) -> StoreResult<Vec<Permission>>;
}

// =============================================================================
// Memberships & bindings
// =============================================================================

/// Operations on the `org_members` collection. `(org_id, user_id)` is unique.
#[async_trait]
pub trait OrgMemberStore: Send + Sync {
    /// Adds a membership. Fails with a conflict if one already exists.
    async fn add_org_member(&self, member: &OrgMember) -> StoreResult<()>;

    /// Removes a membership.
    async fn remove_org_member(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<()>;

    /// Fetches the membership row for `(org_id, user_id)`.
    async fn get_org_membership(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<OrgMember>;

    /// Changes the role of an existing membership.
    async fn update_org_member_role(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> StoreResult<()>;

    /// Lists an organization's memberships.
    async fn list_org_members(&self, org_id: Uuid) -> StoreResult<Vec<OrgMember>>;
}

/// Operations on the `team_members` collection. `(team_id, user_id)` is unique.
#[async_trait]
pub trait TeamMemberStore: Send + Sync {
    /// Adds a membership. Fails with a conflict if one already exists.
    async fn add_team_member(&self, member: &TeamMember) -> StoreResult<()>;

    /// Removes a membership.
    async fn remove_team_member(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<()>;

    /// Lists a team's memberships.
    async fn list_team_members(&self, team_id: Uuid) -> StoreResult<Vec<TeamMember>>;
}

/// Operations on the `sa_role_bindings` collection.
/// `(service_account_id, role_id, org_id)` is unique.
#[async_trait]
pub trait SaRoleBindingStore: Send + Sync {
    /// Assigns a role binding. Idempotent.
    async fn assign_sa_role(&self, binding: &SaRoleBinding) -> StoreResult<()>;

    /// Removes a role binding.
    async fn revoke_sa_role(
        &self,
        service_account_id: Uuid,
        role_id: Uuid,
        org_id: Uuid,
    ) -> StoreResult<()>;

    /// Lists bindings for a service account.
    async fn list_sa_roles(&self, service_account_id: Uuid) -> StoreResult<Vec<SaRoleBinding>>;
}

// =============================================================================
// Aggregate
// =============================================================================

/// The full store surface consumed by the service core.
pub trait Store:
    UserStore
    + OAuthAccountStore
    + SessionStore
    + ApiKeyStore
    + ServiceAccountStore
    + ServiceAccountKeyStore
    + RoleStore
    + PermissionStore
    + RolePermissionStore
    + OrgMemberStore
    + TeamMemberStore
    + SaRoleBindingStore
{
}

impl<T> Store for T where
    T: UserStore
        + OAuthAccountStore
        + SessionStore
        + ApiKeyStore
        + ServiceAccountStore
        + ServiceAccountKeyStore
        + RoleStore
        + PermissionStore
        + RolePermissionStore
        + OrgMemberStore
        + TeamMemberStore
        + SaRoleBindingStore
{
}
