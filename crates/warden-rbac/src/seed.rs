// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Default role and permission seeding.
//!
//! Creates the system permission set and the role hierarchy
//! `viewer <- member <- admin <- owner` on first startup: `viewer` is the
//! root, each role inherits everything above it through the ancestor
//! walk, so `owner` carries the full set. Idempotent: a store that
//! already holds the `owner` system role is left untouched.

use std::collections::HashMap;

use uuid::Uuid;

use warden_core::{Permission, Result, Role};
use warden_store::{PermissionStore, RolePermissionStore, RoleStore, Store, StoreError};

/// System permissions, `resource:action` form.
const DEFAULT_PERMISSIONS: &[(&str, &str)] = &[
    // Organization
    ("org:create", "Create organizations"),
    ("org:read", "View organization details"),
    ("org:update", "Update organization settings"),
    ("org:delete", "Delete organizations"),
    // Team
    ("team:create", "Create teams within an organization"),
    ("team:read", "View team details"),
    ("team:update", "Update team settings"),
    ("team:delete", "Delete teams"),
    // Members
    ("member:invite", "Invite members to an organization"),
    ("member:remove", "Remove members from an organization"),
    ("member:update_role", "Change a member's role"),
    // Roles
    ("role:create", "Create new roles"),
    ("role:read", "View role details"),
    ("role:update", "Update roles"),
    ("role:delete", "Delete roles"),
    ("role:assign", "Assign roles to users"),
    // Permissions
    ("permission:read", "View permissions"),
    ("permission:assign", "Assign permissions to roles"),
    // Users
    ("user:read", "View user profiles"),
    ("user:update", "Update user profiles"),
    ("user:delete", "Delete user accounts"),
    ("user:list", "List all users"),
    // API keys
    ("apikey:create", "Create API keys"),
    ("apikey:read", "View API keys"),
    ("apikey:revoke", "Revoke API keys"),
    // Service accounts
    ("service_account:create", "Create service accounts"),
    ("service_account:read", "View service accounts"),
    ("service_account:update", "Update service accounts"),
    ("service_account:delete", "Delete service accounts"),
    ("service_account:manage_keys", "Manage service account keys"),
    ("service_account:assign_role", "Assign roles to service accounts"),
];

/// System roles in parent-first order, with their direct permissions.
const DEFAULT_ROLES: &[(&str, &str, Option<&str>, &[&str])] = &[
    (
        "viewer",
        "Read-only access",
        None,
        &[
            "org:read",
            "team:read",
            "role:read",
            "permission:read",
            "user:read",
            "service_account:read",
        ],
    ),
    (
        "member",
        "Standard member access",
        Some("viewer"),
        &["team:create", "apikey:create", "apikey:read", "apikey:revoke"],
    ),
    (
        "admin",
        "Administrative access",
        Some("member"),
        &[
            "org:update",
            "team:update",
            "team:delete",
            "member:invite",
            "member:remove",
            "member:update_role",
            "role:create",
            "role:update",
            "role:assign",
            "user:list",
            "service_account:create",
            "service_account:update",
            "service_account:manage_keys",
            "service_account:assign_role",
        ],
    ),
    (
        "owner",
        "Full access (organization owner)",
        Some("admin"),
        &[
            "org:create",
            "org:delete",
            "role:delete",
            "permission:assign",
            "user:delete",
            "user:update",
            "service_account:delete",
        ],
    ),
];

/// Seeds the default permissions and role hierarchy when absent.
pub async fn seed_defaults(store: &dyn Store) -> Result<()> {
    match store.get_role_by_name("owner", None).await {
        Ok(_) => return Ok(()),
        Err(StoreError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let mut permission_ids = HashMap::new();
    for &(name, description) in DEFAULT_PERMISSIONS {
        let permission = Permission {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: Some(description.to_string()),
        };
        store.insert_permission(&permission).await?;
        permission_ids.insert(name, permission.id);
    }

    let mut role_ids: HashMap<&str, Uuid> = HashMap::new();
    for &(name, description, parent, permissions) in DEFAULT_ROLES {
        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: Some(description.to_string()),
            org_id: None,
            parent_role_id: parent.map(|p| role_ids[p]),
        };
        store.insert_role(&role).await?;
        role_ids.insert(name, role.id);

        for permission in permissions {
            store
                .assign_permission(role.id, permission_ids[permission])
                .await?;
        }
    }

    tracing::info!(
        roles = role_ids.len(),
        permissions = permission_ids.len(),
        "seeded default rbac hierarchy"
    );
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use warden_store::{MemoryStore, OrgMemberStore};

    use crate::cache::PermissionCache;
    use crate::resolver::Resolver;

    #[tokio::test]
    async fn test_seed_builds_the_chain_upward() {
        let store = Arc::new(MemoryStore::new());
        seed_defaults(store.as_ref()).await.unwrap();

        let owner = store.get_role_by_name("owner", None).await.unwrap();
        let chain = store.get_role_ancestors(owner.id, 10).await.unwrap();
        let names: Vec<&str> = chain.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["owner", "admin", "member", "viewer"]);

        // viewer is the root.
        let viewer = store.get_role_by_name("viewer", None).await.unwrap();
        assert!(viewer.parent_role_id.is_none());
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        seed_defaults(store.as_ref()).await.unwrap();
        seed_defaults(store.as_ref()).await.unwrap();

        let roles = store.list_roles(None).await.unwrap();
        assert_eq!(roles.len(), 4);
    }

    #[tokio::test]
    async fn test_admin_inherits_reads_but_not_owner_grants() {
        let store = Arc::new(MemoryStore::new());
        seed_defaults(store.as_ref()).await.unwrap();

        let resolver = Resolver::new(store.clone(), Arc::new(PermissionCache::default()));
        let admin = store.get_role_by_name("admin", None).await.unwrap();

        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        store
            .add_org_member(&warden_core::OrgMember {
                org_id: org,
                user_id: user,
                role_id: admin.id,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let perms = resolver
            .resolve_user_permissions(user, Some(org))
            .await
            .unwrap();
        let names: Vec<&str> = perms.iter().map(|p| p.name.as_str()).collect();

        // Inherited from viewer/member.
        assert!(names.contains(&"org:read"));
        assert!(names.contains(&"team:create"));
        // Direct.
        assert!(names.contains(&"member:invite"));
        // Owner-only grants do not flow down.
        assert!(!names.contains(&"org:delete"));
        assert!(!names.contains(&"permission:assign"));
    }
}
