// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! RBAC administration handlers.
//!
//! Mutations are guarded by the method policy; reads and the check
//! endpoint require authentication only. Membership changes invalidate
//! the affected user's cached resolutions; role/permission edits rely on
//! the cache TTL.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_core::{OrgMember, Permission, Role};
use warden_store::{OrgMemberStore, PermissionStore, RolePermissionStore, RoleStore, StoreError};

use crate::error::{ApiError, ApiResult};
use crate::handlers::parse_id;
use crate::response::Ack;
use crate::state::AppState;

// =============================================================================
// Roles
// =============================================================================

/// Role create request body.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    /// Role name, unique per `(name, org_id)`.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Owning organization; absent for system roles.
    pub org_id: Option<Uuid>,
    /// Parent role to inherit from.
    pub parent_role_id: Option<Uuid>,
}

/// POST /v1/rbac/roles
pub async fn create_role(
    State(state): State<AppState>,
    Json(request): Json<CreateRoleRequest>,
) -> ApiResult<Json<Role>> {
    if request.name.is_empty() {
        return Err(ApiError::invalid_argument("name is required"));
    }
    if let Some(parent) = request.parent_role_id {
        match state.store.get_role(parent).await {
            Ok(_) => {}
            Err(StoreError::NotFound) => {
                return Err(ApiError::not_found("parent role not found"))
            }
            Err(e) => return Err(e.into()),
        }
    }

    let role = Role {
        id: Uuid::new_v4(),
        name: request.name,
        description: request.description,
        org_id: request.org_id,
        parent_role_id: request.parent_role_id,
    };
    state.store.insert_role(&role).await?;
    Ok(Json(role))
}

/// Query parameters for role listing.
#[derive(Debug, Deserialize)]
pub struct ListRolesQuery {
    /// Org scope; system roles are always included.
    pub org_id: Option<Uuid>,
}

/// GET /v1/rbac/roles
pub async fn list_roles(
    State(state): State<AppState>,
    Query(query): Query<ListRolesQuery>,
) -> ApiResult<Json<Vec<Role>>> {
    let roles = state.store.list_roles(query.org_id).await?;
    Ok(Json(roles))
}

// =============================================================================
// Permissions
// =============================================================================

/// Permission create request body.
#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    /// Globally unique name, `resource:action` form.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
}

/// POST /v1/rbac/permissions
pub async fn create_permission(
    State(state): State<AppState>,
    Json(request): Json<CreatePermissionRequest>,
) -> ApiResult<Json<Permission>> {
    if !Permission::is_valid_name(&request.name) {
        return Err(ApiError::invalid_argument(
            "permission name must have the form resource:action",
        ));
    }

    let permission = Permission {
        id: Uuid::new_v4(),
        name: request.name,
        description: request.description,
    };
    state.store.insert_permission(&permission).await?;
    Ok(Json(permission))
}

/// GET /v1/rbac/permissions
pub async fn list_permissions(State(state): State<AppState>) -> ApiResult<Json<Vec<Permission>>> {
    let permissions = state.store.list_permissions().await?;
    Ok(Json(permissions))
}

/// Role-permission assignment request body.
#[derive(Debug, Deserialize)]
pub struct AssignPermissionRequest {
    /// Permission name to attach.
    pub permission: String,
}

/// POST /v1/rbac/roles/{role_id}/permissions
pub async fn assign_role_permission(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
    Json(request): Json<AssignPermissionRequest>,
) -> ApiResult<Json<Ack>> {
    let role_id = parse_id(&role_id, "role_id")?;

    let role = match state.store.get_role(role_id).await {
        Ok(role) => role,
        Err(StoreError::NotFound) => return Err(ApiError::not_found("role not found")),
        Err(e) => return Err(e.into()),
    };
    let permission = match state.store.get_permission_by_name(&request.permission).await {
        Ok(permission) => permission,
        Err(StoreError::NotFound) => return Err(ApiError::not_found("permission not found")),
        Err(e) => return Err(e.into()),
    };

    state.store.assign_permission(role.id, permission.id).await?;
    Ok(Json(Ack::ok()))
}

// =============================================================================
// Org memberships
// =============================================================================

/// Membership role request body.
#[derive(Debug, Deserialize)]
pub struct SetMemberRoleRequest {
    /// The role the user carries inside the organization.
    pub role_id: Uuid,
}

/// PUT /v1/rbac/orgs/{org_id}/members/{user_id}
///
/// Creates or updates the membership, then drops the user's cached
/// resolutions so the change is visible on the next check.
pub async fn set_org_member(
    State(state): State<AppState>,
    Path((org_id, user_id)): Path<(String, String)>,
    Json(request): Json<SetMemberRoleRequest>,
) -> ApiResult<Json<Ack>> {
    let org_id = parse_id(&org_id, "org_id")?;
    let user_id = parse_id(&user_id, "user_id")?;

    match state.store.get_role(request.role_id).await {
        Ok(_) => {}
        Err(StoreError::NotFound) => return Err(ApiError::not_found("role not found")),
        Err(e) => return Err(e.into()),
    }

    match state
        .store
        .update_org_member_role(org_id, user_id, request.role_id)
        .await
    {
        Ok(()) => {}
        Err(StoreError::NotFound) => {
            state
                .store
                .add_org_member(&OrgMember {
                    org_id,
                    user_id,
                    role_id: request.role_id,
                    created_at: Utc::now(),
                })
                .await?;
        }
        Err(e) => return Err(e.into()),
    }

    state.checker.invalidate_user(user_id);
    Ok(Json(Ack::ok()))
}

/// DELETE /v1/rbac/orgs/{org_id}/members/{user_id}
pub async fn remove_org_member(
    State(state): State<AppState>,
    Path((org_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<Ack>> {
    let org_id = parse_id(&org_id, "org_id")?;
    let user_id = parse_id(&user_id, "user_id")?;

    match state.store.remove_org_member(org_id, user_id).await {
        Ok(()) => {}
        Err(StoreError::NotFound) => return Err(ApiError::not_found("membership not found")),
        Err(e) => return Err(e.into()),
    }

    state.checker.invalidate_user(user_id);
    Ok(Json(Ack::ok()))
}

// =============================================================================
// Policy check
// =============================================================================

/// Check request body: exactly one principal field must be set.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    /// User principal to check.
    pub user_id: Option<Uuid>,
    /// Service-account principal to check.
    pub service_account_id: Option<Uuid>,
    /// Permission name.
    pub permission: String,
    /// Org scope.
    pub org_id: Option<Uuid>,
}

/// Check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    /// Whether the permission is granted.
    pub allowed: bool,
    /// Granting role, when tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_role: Option<String>,
}

/// POST /v1/rbac/check
pub async fn check_permission(
    State(state): State<AppState>,
    Json(request): Json<CheckRequest>,
) -> ApiResult<Json<CheckResponse>> {
    if request.permission.is_empty() {
        return Err(ApiError::invalid_argument("permission is required"));
    }

    let decision = match (request.user_id, request.service_account_id) {
        (Some(user_id), None) => {
            state
                .checker
                .check(user_id, &request.permission, request.org_id)
                .await?
        }
        (None, Some(sa_id)) => {
            state
                .checker
                .check_service_account(sa_id, &request.permission, request.org_id)
                .await?
        }
        _ => {
            return Err(ApiError::invalid_argument(
                "exactly one of user_id and service_account_id is required",
            ))
        }
    };

    Ok(Json(CheckResponse {
        allowed: decision.allowed,
        matched_role: decision.matched_role,
    }))
}
