// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service account management handlers.
//!
//! Authenticated-only surface: creating accounts, minting keys, binding
//! roles, and toggling status. The keys these accounts hold are what
//! pass the guarded administrative methods later.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_auth::token::{generate_token, key_prefix, token_digest, DEFAULT_TOKEN_BYTES};
use warden_core::{SaRoleBinding, ServiceAccount, ServiceAccountKey, ServiceAccountStatus};
use warden_store::{
    RoleStore, SaRoleBindingStore, ServiceAccountKeyStore, ServiceAccountStore, StoreError,
};

use crate::error::{ApiError, ApiResult};
use crate::handlers::parse_id;
use crate::response::Ack;
use crate::state::AppState;

// =============================================================================
// Accounts
// =============================================================================

/// Create request body.
#[derive(Debug, Deserialize)]
pub struct CreateServiceAccountRequest {
    /// Owning organization.
    pub org_id: Uuid,
    /// Human-readable label.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
}

/// POST /v1/service-accounts
pub async fn create_service_account(
    State(state): State<AppState>,
    Json(request): Json<CreateServiceAccountRequest>,
) -> ApiResult<Json<ServiceAccount>> {
    if request.name.is_empty() {
        return Err(ApiError::invalid_argument("name is required"));
    }

    let account = ServiceAccount {
        id: Uuid::new_v4(),
        org_id: request.org_id,
        name: request.name,
        description: request.description,
        status: ServiceAccountStatus::Active,
        created_at: Utc::now(),
    };
    state.store.insert_service_account(&account).await?;
    Ok(Json(account))
}

/// Status update body.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    /// The new status.
    pub status: ServiceAccountStatus,
}

/// PUT /v1/service-accounts/{id}/status
///
/// Disabling an account rejects all of its keys on the next request.
pub async fn set_service_account_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetStatusRequest>,
) -> ApiResult<Json<Ack>> {
    let id = parse_id(&id, "service_account_id")?;
    match state.store.set_service_account_status(id, request.status).await {
        Ok(()) => Ok(Json(Ack::ok())),
        Err(StoreError::NotFound) => Err(ApiError::not_found("service account not found")),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Keys
// =============================================================================

/// Key create request body.
#[derive(Debug, Deserialize)]
pub struct CreateServiceAccountKeyRequest {
    /// Human-readable label.
    pub name: String,
    /// Key lifetime in seconds; absent means no expiry.
    pub expires_in_secs: Option<i64>,
}

/// Key create response: the record plus the one-time plaintext.
#[derive(Debug, Serialize)]
pub struct CreateServiceAccountKeyResponse {
    /// The stored record.
    pub key: ServiceAccountKey,
    /// The plaintext key. Shown exactly once.
    pub plaintext: String,
}

/// POST /v1/service-accounts/{id}/keys
pub async fn create_service_account_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateServiceAccountKeyRequest>,
) -> ApiResult<Json<CreateServiceAccountKeyResponse>> {
    let service_account_id = parse_id(&id, "service_account_id")?;
    if request.name.is_empty() {
        return Err(ApiError::invalid_argument("name is required"));
    }

    // The account must exist before a key can reference it.
    match state.store.get_service_account(service_account_id).await {
        Ok(_) => {}
        Err(StoreError::NotFound) => {
            return Err(ApiError::not_found("service account not found"))
        }
        Err(e) => return Err(e.into()),
    }

    let plaintext = generate_token(DEFAULT_TOKEN_BYTES)?;
    let key = ServiceAccountKey {
        id: Uuid::new_v4(),
        service_account_id,
        name: request.name,
        key_prefix: key_prefix(&plaintext),
        key_digest: token_digest(&plaintext),
        expires_at: request
            .expires_in_secs
            .map(|secs| Utc::now() + Duration::seconds(secs)),
        revoked: false,
        last_used_at: None,
        created_at: Utc::now(),
    };
    state.store.insert_service_account_key(&key).await?;

    Ok(Json(CreateServiceAccountKeyResponse { key, plaintext }))
}

/// GET /v1/service-accounts/{id}/keys
pub async fn list_service_account_keys(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ServiceAccountKey>>> {
    let service_account_id = parse_id(&id, "service_account_id")?;
    let keys = state
        .store
        .list_service_account_keys(service_account_id)
        .await?;
    Ok(Json(keys))
}

// =============================================================================
// Role bindings
// =============================================================================

/// Binding request body.
#[derive(Debug, Deserialize)]
pub struct BindRoleRequest {
    /// The role to bind.
    pub role_id: Uuid,
    /// Organization scope of the binding.
    pub org_id: Uuid,
}

/// POST /v1/service-accounts/{id}/bindings
pub async fn bind_service_account_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<BindRoleRequest>,
) -> ApiResult<Json<Ack>> {
    let service_account_id = parse_id(&id, "service_account_id")?;

    match state.store.get_service_account(service_account_id).await {
        Ok(_) => {}
        Err(StoreError::NotFound) => {
            return Err(ApiError::not_found("service account not found"))
        }
        Err(e) => return Err(e.into()),
    }
    match state.store.get_role(request.role_id).await {
        Ok(_) => {}
        Err(StoreError::NotFound) => return Err(ApiError::not_found("role not found")),
        Err(e) => return Err(e.into()),
    }

    state
        .store
        .assign_sa_role(&SaRoleBinding {
            service_account_id,
            role_id: request.role_id,
            org_id: request.org_id,
            created_at: Utc::now(),
        })
        .await?;
    Ok(Json(Ack::ok()))
}

/// DELETE /v1/service-accounts/{id}/keys/{key_id}
pub async fn revoke_service_account_key(
    State(state): State<AppState>,
    Path((id, key_id)): Path<(String, String)>,
) -> ApiResult<Json<Ack>> {
    let service_account_id = parse_id(&id, "service_account_id")?;
    let key_id = parse_id(&key_id, "key_id")?;

    let keys = state
        .store
        .list_service_account_keys(service_account_id)
        .await?;
    if !keys.iter().any(|k| k.id == key_id) {
        return Err(ApiError::not_found("service account key not found"));
    }

    state.store.revoke_service_account_key(key_id).await?;
    Ok(Json(Ack::ok()))
}
