// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory store backend.
//!
//! Thread-safe tables behind `parking_lot::RwLock`, with the same
//! unique-key invariants the relational schema enforces. Backs the test
//! suite and single-node deployments; data is lost on drop.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use warden_core::{
    ApiKey, OAuthAccount, OrgMember, Permission, Role, SaRoleBinding, ServiceAccount,
    ServiceAccountKey, ServiceAccountStatus, Session, TeamMember, User,
};

use crate::error::{StoreError, StoreResult};
use crate::traits::{
    ApiKeyStore, OAuthAccountStore, OrgMemberStore, PermissionStore, RolePermissionStore,
    RoleStore, SaRoleBindingStore, ServiceAccountKeyStore, ServiceAccountStore, SessionStore,
    TeamMemberStore, UserStore,
};

// =============================================================================
// MemoryStore
// =============================================================================

/// An in-process store holding every collection in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    users_by_email: RwLock<HashMap<String, Uuid>>,
    oauth_accounts: RwLock<Vec<OAuthAccount>>,
    sessions: RwLock<HashMap<String, Session>>,
    api_keys: RwLock<HashMap<Uuid, ApiKey>>,
    service_accounts: RwLock<HashMap<Uuid, ServiceAccount>>,
    sa_keys: RwLock<HashMap<Uuid, ServiceAccountKey>>,
    roles: RwLock<HashMap<Uuid, Role>>,
    permissions: RwLock<HashMap<Uuid, Permission>>,
    role_permissions: RwLock<Vec<(Uuid, Uuid)>>,
    org_members: RwLock<Vec<OrgMember>>,
    team_members: RwLock<Vec<TeamMember>>,
    sa_role_bindings: RwLock<Vec<SaRoleBinding>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut by_email = self.users_by_email.write();
        if by_email.contains_key(&user.email) {
            return Err(StoreError::conflict("users.email"));
        }
        by_email.insert(user.email.clone(), user.id);
        self.users.write().insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        self.users.read().get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let by_email = self.users_by_email.read();
        let id = by_email.get(email).ok_or(StoreError::NotFound)?;
        self.users.read().get(id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write();
        let existing = users.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        if existing.email != user.email {
            let mut by_email = self.users_by_email.write();
            if by_email.contains_key(&user.email) {
                return Err(StoreError::conflict("users.email"));
            }
            by_email.remove(&existing.email);
            by_email.insert(user.email.clone(), user.id);
        }
        *existing = user.clone();
        Ok(())
    }

    async fn soft_delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut users = self.users.write();
        let user = users.remove(&id).ok_or(StoreError::NotFound)?;
        self.users_by_email.write().remove(&user.email);
        Ok(())
    }
}

// =============================================================================
// OAuth accounts
// =============================================================================

#[async_trait]
impl OAuthAccountStore for MemoryStore {
    async fn insert_oauth_account(&self, account: &OAuthAccount) -> StoreResult<()> {
        let mut accounts = self.oauth_accounts.write();
        if accounts.iter().any(|a| {
            a.provider == account.provider && a.provider_account_id == account.provider_account_id
        }) {
            return Err(StoreError::conflict("oauth_accounts.provider_pair"));
        }
        if accounts
            .iter()
            .any(|a| a.user_id == account.user_id && a.provider == account.provider)
        {
            return Err(StoreError::conflict("oauth_accounts.user_provider"));
        }
        accounts.push(account.clone());
        Ok(())
    }

    async fn get_oauth_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> StoreResult<OAuthAccount> {
        self.oauth_accounts
            .read()
            .iter()
            .find(|a| a.provider == provider && a.provider_account_id == provider_account_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_oauth_account_for_user(
        &self,
        user_id: Uuid,
        provider: &str,
    ) -> StoreResult<OAuthAccount> {
        self.oauth_accounts
            .read()
            .iter()
            .find(|a| a.user_id == user_id && a.provider == provider)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

// =============================================================================
// Sessions
// =============================================================================

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&session.refresh_digest) {
            return Err(StoreError::conflict("sessions.refresh_digest"));
        }
        sessions.insert(session.refresh_digest.clone(), session.clone());
        Ok(())
    }

    async fn get_session_by_digest(&self, digest: &str) -> StoreResult<Session> {
        self.sessions
            .read()
            .get(digest)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn mark_revoked_by_digest(&self, digest: &str) -> StoreResult<bool> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(digest).ok_or(StoreError::NotFound)?;
        let was_revoked = session.revoked;
        session.revoked = true;
        Ok(was_revoked)
    }

    async fn mark_revoked_by_family(&self, family_id: Uuid) -> StoreResult<usize> {
        let mut sessions = self.sessions.write();
        let mut count = 0;
        for session in sessions.values_mut() {
            if session.family_id == family_id && !session.revoked {
                session.revoked = true;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn mark_revoked_by_user(&self, user_id: Uuid) -> StoreResult<usize> {
        let mut sessions = self.sessions.write();
        let mut count = 0;
        for session in sessions.values_mut() {
            if session.user_id == user_id && !session.revoked {
                session.revoked = true;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_expired_sessions(&self) -> StoreResult<usize> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok(before - sessions.len())
    }
}

// =============================================================================
// API keys
// =============================================================================

#[async_trait]
impl ApiKeyStore for MemoryStore {
    async fn insert_api_key(&self, key: &ApiKey) -> StoreResult<()> {
        let mut keys = self.api_keys.write();
        if keys.values().any(|k| k.key_digest == key.key_digest) {
            return Err(StoreError::conflict("api_keys.key_digest"));
        }
        keys.insert(key.id, key.clone());
        Ok(())
    }

    async fn get_api_key_by_digest(&self, digest: &str) -> StoreResult<ApiKey> {
        self.api_keys
            .read()
            .values()
            .find(|k| k.key_digest == digest && !k.revoked)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_api_key(&self, id: Uuid) -> StoreResult<ApiKey> {
        self.api_keys.read().get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list_api_keys_by_user(&self, user_id: Uuid) -> StoreResult<Vec<ApiKey>> {
        let mut keys: Vec<ApiKey> = self
            .api_keys
            .read()
            .values()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn revoke_api_key(&self, id: Uuid) -> StoreResult<()> {
        let mut keys = self.api_keys.write();
        let key = keys.get_mut(&id).ok_or(StoreError::NotFound)?;
        key.revoked = true;
        Ok(())
    }

    async fn touch_api_key(&self, id: Uuid) -> StoreResult<()> {
        let mut keys = self.api_keys.write();
        let key = keys.get_mut(&id).ok_or(StoreError::NotFound)?;
        key.last_used_at = Some(Utc::now());
        Ok(())
    }
}

// =============================================================================
// Service accounts & keys
// =============================================================================

#[async_trait]
impl ServiceAccountStore for MemoryStore {
    async fn insert_service_account(&self, account: &ServiceAccount) -> StoreResult<()> {
        self.service_accounts
            .write()
            .insert(account.id, account.clone());
        Ok(())
    }

    async fn get_service_account(&self, id: Uuid) -> StoreResult<ServiceAccount> {
        self.service_accounts
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn set_service_account_status(
        &self,
        id: Uuid,
        status: ServiceAccountStatus,
    ) -> StoreResult<()> {
        let mut accounts = self.service_accounts.write();
        let account = accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        account.status = status;
        Ok(())
    }

    async fn list_service_accounts_by_org(&self, org_id: Uuid) -> StoreResult<Vec<ServiceAccount>> {
        Ok(self
            .service_accounts
            .read()
            .values()
            .filter(|a| a.org_id == org_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ServiceAccountKeyStore for MemoryStore {
    async fn insert_service_account_key(&self, key: &ServiceAccountKey) -> StoreResult<()> {
        let mut keys = self.sa_keys.write();
        if keys.values().any(|k| k.key_digest == key.key_digest) {
            return Err(StoreError::conflict("service_account_keys.key_digest"));
        }
        keys.insert(key.id, key.clone());
        Ok(())
    }

    async fn get_service_account_key_by_digest(
        &self,
        digest: &str,
    ) -> StoreResult<(ServiceAccountKey, ServiceAccount)> {
        let key = self
            .sa_keys
            .read()
            .values()
            .find(|k| k.key_digest == digest && !k.revoked)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        let account = self
            .service_accounts
            .read()
            .get(&key.service_account_id)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        Ok((key, account))
    }

    async fn list_service_account_keys(
        &self,
        service_account_id: Uuid,
    ) -> StoreResult<Vec<ServiceAccountKey>> {
        let mut keys: Vec<ServiceAccountKey> = self
            .sa_keys
            .read()
            .values()
            .filter(|k| k.service_account_id == service_account_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn revoke_service_account_key(&self, id: Uuid) -> StoreResult<()> {
        let mut keys = self.sa_keys.write();
        let key = keys.get_mut(&id).ok_or(StoreError::NotFound)?;
        key.revoked = true;
        Ok(())
    }

    async fn touch_service_account_key(&self, id: Uuid) -> StoreResult<()> {
        let mut keys = self.sa_keys.write();
        let key = keys.get_mut(&id).ok_or(StoreError::NotFound)?;
        key.last_used_at = Some(Utc::now());
        Ok(())
    }
}

// =============================================================================
// Roles & permissions
// =============================================================================

#[async_trait]
impl RoleStore for MemoryStore {
    async fn insert_role(&self, role: &Role) -> StoreResult<()> {
        let mut roles = self.roles.write();
        if roles
            .values()
            .any(|r| r.name == role.name && r.org_id == role.org_id)
        {
            return Err(StoreError::conflict("roles.name_org"));
        }
        roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn get_role(&self, id: Uuid) -> StoreResult<Role> {
        self.roles.read().get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_role_by_name(&self, name: &str, org_id: Option<Uuid>) -> StoreResult<Role> {
        self.roles
            .read()
            .values()
            .find(|r| r.name == name && r.org_id == org_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_role_ancestors(&self, role_id: Uuid, max_depth: usize) -> StoreResult<Vec<Role>> {
        let roles = self.roles.read();
        let mut chain = Vec::new();
        let mut current = Some(role_id);

        while let Some(id) = current {
            if chain.len() >= max_depth {
                break;
            }
            let Some(role) = roles.get(&id) else {
                break;
            };
            // A repeated id means the parent chain loops; stop rather than spin.
            if chain.iter().any(|r: &Role| r.id == id) {
                break;
            }
            chain.push(role.clone());
            current = role.parent_role_id;
        }

        if chain.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(chain)
    }

    async fn list_roles(&self, org_id: Option<Uuid>) -> StoreResult<Vec<Role>> {
        Ok(self
            .roles
            .read()
            .values()
            .filter(|r| r.org_id.is_none() || r.org_id == org_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn insert_permission(&self, permission: &Permission) -> StoreResult<()> {
        let mut permissions = self.permissions.write();
        if permissions.values().any(|p| p.name == permission.name) {
            return Err(StoreError::conflict("permissions.name"));
        }
        permissions.insert(permission.id, permission.clone());
        Ok(())
    }

    async fn get_permission_by_name(&self, name: &str) -> StoreResult<Permission> {
        self.permissions
            .read()
            .values()
            .find(|p| p.name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_permissions(&self) -> StoreResult<Vec<Permission>> {
        Ok(self.permissions.read().values().cloned().collect())
    }
}

#[async_trait]
impl RolePermissionStore for MemoryStore {
    async fn assign_permission(&self, role_id: Uuid, permission_id: Uuid) -> StoreResult<()> {
        let mut assignments = self.role_permissions.write();
        if !assignments.contains(&(role_id, permission_id)) {
            assignments.push((role_id, permission_id));
        }
        Ok(())
    }

    async fn revoke_permission(&self, role_id: Uuid, permission_id: Uuid) -> StoreResult<()> {
        self.role_permissions
            .write()
            .retain(|&(r, p)| !(r == role_id && p == permission_id));
        Ok(())
    }

    async fn permissions_for_role_ids(&self, role_ids: &[Uuid]) -> StoreResult<Vec<Permission>> {
        let assignments = self.role_permissions.read();
        let permissions = self.permissions.read();

        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for &(role_id, permission_id) in assignments.iter() {
            if role_ids.contains(&role_id) && seen.insert(permission_id) {
                if let Some(p) = permissions.get(&permission_id) {
                    out.push(p.clone());
                }
            }
        }
        Ok(out)
    }
}

// =============================================================================
// Memberships & bindings
// =============================================================================

#[async_trait]
impl OrgMemberStore for MemoryStore {
    async fn add_org_member(&self, member: &OrgMember) -> StoreResult<()> {
        let mut members = self.org_members.write();
        if members
            .iter()
            .any(|m| m.org_id == member.org_id && m.user_id == member.user_id)
        {
            return Err(StoreError::conflict("org_members.org_user"));
        }
        members.push(member.clone());
        Ok(())
    }

    async fn remove_org_member(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let mut members = self.org_members.write();
        let before = members.len();
        members.retain(|m| !(m.org_id == org_id && m.user_id == user_id));
        if members.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_org_membership(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<OrgMember> {
        self.org_members
            .read()
            .iter()
            .find(|m| m.org_id == org_id && m.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_org_member_role(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> StoreResult<()> {
        let mut members = self.org_members.write();
        let member = members
            .iter_mut()
            .find(|m| m.org_id == org_id && m.user_id == user_id)
            .ok_or(StoreError::NotFound)?;
        member.role_id = role_id;
        Ok(())
    }

    async fn list_org_members(&self, org_id: Uuid) -> StoreResult<Vec<OrgMember>> {
        Ok(self
            .org_members
            .read()
            .iter()
            .filter(|m| m.org_id == org_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TeamMemberStore for MemoryStore {
    async fn add_team_member(&self, member: &TeamMember) -> StoreResult<()> {
        let mut members = self.team_members.write();
        if members
            .iter()
            .any(|m| m.team_id == member.team_id && m.user_id == member.user_id)
        {
            return Err(StoreError::conflict("team_members.team_user"));
        }
        members.push(member.clone());
        Ok(())
    }

    async fn remove_team_member(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let mut members = self.team_members.write();
        let before = members.len();
        members.retain(|m| !(m.team_id == team_id && m.user_id == user_id));
        if members.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_team_members(&self, team_id: Uuid) -> StoreResult<Vec<TeamMember>> {
        Ok(self
            .team_members
            .read()
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SaRoleBindingStore for MemoryStore {
    async fn assign_sa_role(&self, binding: &SaRoleBinding) -> StoreResult<()> {
        let mut bindings = self.sa_role_bindings.write();
        if !bindings.iter().any(|b| {
            b.service_account_id == binding.service_account_id
                && b.role_id == binding.role_id
                && b.org_id == binding.org_id
        }) {
            bindings.push(binding.clone());
        }
        Ok(())
    }

    async fn revoke_sa_role(
        &self,
        service_account_id: Uuid,
        role_id: Uuid,
        org_id: Uuid,
    ) -> StoreResult<()> {
        self.sa_role_bindings.write().retain(|b| {
            !(b.service_account_id == service_account_id
                && b.role_id == role_id
                && b.org_id == org_id)
        });
        Ok(())
    }

    async fn list_sa_roles(&self, service_account_id: Uuid) -> StoreResult<Vec<SaRoleBinding>> {
        Ok(self
            .sa_role_bindings
            .read()
            .iter()
            .filter(|b| b.service_account_id == service_account_id)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
