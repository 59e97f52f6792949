// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role hierarchy resolver.
//!
//! Computes the effective permission set for a principal in an optional
//! org scope: collect direct roles, expand each through its ancestor
//! chain (bounded by `max_depth`), and union the permissions attached to
//! the expanded set. User resolutions are cached by name under the
//! `(user, scope)` key.
//!
//! Team memberships are tracked in the store but do not contribute here.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use warden_core::{Error, Permission, Result, Role};
use warden_store::{
    OrgMemberStore, RolePermissionStore, RoleStore, SaRoleBindingStore, Store, StoreError,
};

use crate::cache::{cache_key, PermissionCache};
use crate::DEFAULT_MAX_DEPTH;

// =============================================================================
// Resolver
// =============================================================================

/// Resolves effective permissions through the role hierarchy.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn Store>,
    cache: Arc<PermissionCache>,
    max_depth: usize,
}

impl Resolver {
    /// Creates a resolver with the default hierarchy depth bound.
    pub fn new(store: Arc<dyn Store>, cache: Arc<PermissionCache>) -> Self {
        Self {
            store,
            cache,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Overrides the hierarchy depth bound.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the permission cache.
    pub fn cache(&self) -> &Arc<PermissionCache> {
        &self.cache
    }

    /// Resolves all effective permissions for a user in the given scope.
    pub async fn resolve_user_permissions(
        &self,
        user_id: Uuid,
        org_id: Option<Uuid>,
    ) -> Result<Vec<Permission>> {
        let key = cache_key(user_id, org_id);
        if let Some(names) = self.cache.get(&key) {
            return Ok(permissions_from_names(names));
        }

        let direct = self.collect_user_role_ids(user_id, org_id).await?;
        let expanded = self.expand_role_ids(&direct).await?;
        let permissions = self.store.permissions_for_role_ids(&expanded).await?;

        let names = permissions.iter().map(|p| p.name.clone()).collect();
        self.cache.set(&key, names);

        Ok(permissions)
    }

    /// Resolves all effective permissions for a service account.
    ///
    /// Bindings are filtered by `org_id` when given. Uncached: service
    /// accounts authenticate rarely compared to interactive users.
    pub async fn resolve_service_account_permissions(
        &self,
        service_account_id: Uuid,
        org_id: Option<Uuid>,
    ) -> Result<Vec<Permission>> {
        let bindings = self.store.list_sa_roles(service_account_id).await?;
        let direct: Vec<Uuid> = bindings
            .iter()
            .filter(|b| org_id.map_or(true, |org| b.org_id == org))
            .map(|b| b.role_id)
            .collect();

        let expanded = self.expand_role_ids(&direct).await?;
        Ok(self.store.permissions_for_role_ids(&expanded).await?)
    }

    /// Collects the direct role ids for a user in the given scope.
    ///
    /// With an org scope, the user's membership role in that org; no
    /// membership means an empty set. Without a scope the set is empty.
    async fn collect_user_role_ids(
        &self,
        user_id: Uuid,
        org_id: Option<Uuid>,
    ) -> Result<Vec<Uuid>> {
        let Some(org) = org_id else {
            return Ok(Vec::new());
        };

        match self.store.get_org_membership(org, user_id).await {
            Ok(member) => Ok(vec![member.role_id]),
            Err(StoreError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Expands direct role ids into the union of their ancestor chains.
    async fn expand_role_ids(&self, direct: &[Uuid]) -> Result<Vec<Uuid>> {
        let mut expanded = HashSet::new();
        for &role_id in direct {
            let chain = match self.store.get_role_ancestors(role_id, self.max_depth).await {
                Ok(chain) => chain,
                Err(StoreError::NotFound) => continue,
                Err(e) => return Err(e.into()),
            };
            detect_cycle(&chain)?;
            expanded.extend(chain.into_iter().map(|r| r.id));
        }
        Ok(expanded.into_iter().collect())
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Flags a truncated walk whose tail points back into the chain.
fn detect_cycle(chain: &[Role]) -> Result<()> {
    let Some(last) = chain.last() else {
        return Ok(());
    };
    if let Some(parent) = last.parent_role_id {
        if chain.iter().any(|r| r.id == parent) {
            return Err(Error::internal("role cycle"));
        }
    }
    Ok(())
}

/// Rebuilds permission values from cached names. Only the name carries
/// meaning downstream; ids are not cached.
fn permissions_from_names(names: Vec<String>) -> Vec<Permission> {
    names
        .into_iter()
        .map(|name| Permission {
            id: Uuid::nil(),
            name,
            description: None,
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use warden_core::{OrgMember, SaRoleBinding};
    use warden_store::{MemoryStore, PermissionStore};

    struct Fixture {
        store: Arc<MemoryStore>,
        resolver: Resolver,
        org: Uuid,
        user: Uuid,
        roles: Vec<Role>,
    }

    fn role(name: &str, parent: Option<Uuid>) -> Role {
        Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            org_id: None,
            parent_role_id: parent,
        }
    }

    /// Builds the `viewer <- member <- admin <- owner` chain (viewer is
    /// the root) with `org:read` on viewer, `member:invite` on admin,
    /// `org:delete` on owner.
    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(PermissionCache::default());
        let resolver = Resolver::new(store.clone(), cache);

        let viewer = role("viewer", None);
        let member = role("member", Some(viewer.id));
        let admin = role("admin", Some(member.id));
        let owner = role("owner", Some(admin.id));
        for r in [&viewer, &member, &admin, &owner] {
            store.insert_role(r).await.unwrap();
        }

        for (role, perm) in [
            (&viewer, "org:read"),
            (&admin, "member:invite"),
            (&owner, "org:delete"),
        ] {
            let p = Permission {
                id: Uuid::new_v4(),
                name: perm.to_string(),
                description: None,
            };
            store.insert_permission(&p).await.unwrap();
            store.assign_permission(role.id, p.id).await.unwrap();
        }

        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        // Membership role is assigned per test.
        Fixture {
            store,
            resolver,
            org,
            user,
            roles: vec![owner, admin, member, viewer],
        }
    }

    async fn join(fix: &Fixture, role_name: &str) {
        let role = fix.roles.iter().find(|r| r.name == role_name).unwrap();
        fix.store
            .add_org_member(&OrgMember {
                org_id: fix.org,
                user_id: fix.user,
                role_id: role.id,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    fn names(perms: &[Permission]) -> Vec<&str> {
        perms.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_admin_inherits_ancestors_not_descendants() {
        let fix = fixture().await;
        join(&fix, "admin").await;

        let perms = fix
            .resolver
            .resolve_user_permissions(fix.user, Some(fix.org))
            .await
            .unwrap();

        let names = names(&perms);
        // Direct grant plus the viewer inheritance.
        assert!(names.contains(&"member:invite"));
        assert!(names.contains(&"org:read"));
        // owner is a descendant; its grants do not flow down.
        assert!(!names.contains(&"org:delete"));
    }

    #[tokio::test]
    async fn test_owner_reaches_the_whole_chain() {
        let fix = fixture().await;
        join(&fix, "owner").await;

        let perms = fix
            .resolver
            .resolve_user_permissions(fix.user, Some(fix.org))
            .await
            .unwrap();

        let names = names(&perms);
        assert!(names.contains(&"org:read"));
        assert!(names.contains(&"member:invite"));
        assert!(names.contains(&"org:delete"));
    }

    #[tokio::test]
    async fn test_no_scope_means_no_permissions() {
        let fix = fixture().await;
        join(&fix, "admin").await;

        let perms = fix
            .resolver
            .resolve_user_permissions(fix.user, None)
            .await
            .unwrap();
        assert!(perms.is_empty());
    }

    #[tokio::test]
    async fn test_no_membership_means_no_permissions() {
        let fix = fixture().await;

        let perms = fix
            .resolver
            .resolve_user_permissions(fix.user, Some(fix.org))
            .await
            .unwrap();
        assert!(perms.is_empty());
    }

    #[tokio::test]
    async fn test_resolution_is_cached_until_invalidated() {
        let fix = fixture().await;
        join(&fix, "viewer").await;

        let before = fix
            .resolver
            .resolve_user_permissions(fix.user, Some(fix.org))
            .await
            .unwrap();
        assert!(!names(&before).contains(&"member:invite"));

        // Promote the user behind the cache's back.
        let admin = fix.roles.iter().find(|r| r.name == "admin").unwrap();
        fix.store
            .update_org_member_role(fix.org, fix.user, admin.id)
            .await
            .unwrap();

        // Stale until explicitly invalidated.
        let stale = fix
            .resolver
            .resolve_user_permissions(fix.user, Some(fix.org))
            .await
            .unwrap();
        assert!(!names(&stale).contains(&"member:invite"));

        fix.resolver.cache().invalidate_user(fix.user);
        let fresh = fix
            .resolver
            .resolve_user_permissions(fix.user, Some(fix.org))
            .await
            .unwrap();
        assert!(names(&fresh).contains(&"member:invite"));
    }

    #[tokio::test]
    async fn test_service_account_bindings_filtered_by_org() {
        let fix = fixture().await;
        let sa = Uuid::new_v4();
        let other_org = Uuid::new_v4();
        let admin = fix.roles.iter().find(|r| r.name == "admin").unwrap();
        let viewer = fix.roles.iter().find(|r| r.name == "viewer").unwrap();

        fix.store
            .assign_sa_role(&SaRoleBinding {
                service_account_id: sa,
                role_id: admin.id,
                org_id: fix.org,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        fix.store
            .assign_sa_role(&SaRoleBinding {
                service_account_id: sa,
                role_id: viewer.id,
                org_id: other_org,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        // Scoped to the admin-binding org: the whole admin chain.
        let scoped = fix
            .resolver
            .resolve_service_account_permissions(sa, Some(fix.org))
            .await
            .unwrap();
        assert!(names(&scoped).contains(&"member:invite"));
        assert!(names(&scoped).contains(&"org:read"));
        assert!(!names(&scoped).contains(&"org:delete"));

        // Scoped to the viewer-binding org: reads only.
        let other = fix
            .resolver
            .resolve_service_account_permissions(sa, Some(other_org))
            .await
            .unwrap();
        assert!(names(&other).contains(&"org:read"));
        assert!(!names(&other).contains(&"member:invite"));

        // Unscoped: every binding contributes.
        let all = fix
            .resolver
            .resolve_service_account_permissions(sa, None)
            .await
            .unwrap();
        assert!(names(&all).contains(&"member:invite"));
    }

    #[tokio::test]
    async fn test_role_cycle_reported() {
        let store = Arc::new(MemoryStore::new());
        let resolver = Resolver::new(store.clone(), Arc::new(PermissionCache::default()));

        let a_id = Uuid::new_v4();
        let b_id = Uuid::new_v4();
        store
            .insert_role(&Role {
                id: a_id,
                name: "a".to_string(),
                description: None,
                org_id: None,
                parent_role_id: Some(b_id),
            })
            .await
            .unwrap();
        store
            .insert_role(&Role {
                id: b_id,
                name: "b".to_string(),
                description: None,
                org_id: None,
                parent_role_id: Some(a_id),
            })
            .await
            .unwrap();

        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        store
            .add_org_member(&OrgMember {
                org_id: org,
                user_id: user,
                role_id: a_id,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let err = resolver
            .resolve_user_permissions(user, Some(org))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "role cycle");
    }
}
