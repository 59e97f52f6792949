// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API key management handlers.
//!
//! The plaintext key appears exactly once, in the create response. Only
//! the digest is stored; the record is never recoverable afterwards.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_auth::token::{generate_token, key_prefix, token_digest, DEFAULT_TOKEN_BYTES};
use warden_core::ApiKey;
use warden_store::{ApiKeyStore, StoreError};

use crate::error::{ApiError, ApiResult};
use crate::extractors::ActingUser;
use crate::handlers::parse_id;
use crate::response::Ack;
use crate::state::AppState;

// =============================================================================
// Create
// =============================================================================

/// Create request body.
#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    /// Human-readable label.
    pub name: String,
    /// Scope names granted to the key.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Key lifetime in seconds; absent means no expiry.
    pub expires_in_secs: Option<i64>,
}

/// Create response: the record plus the one-time plaintext.
#[derive(Debug, Serialize)]
pub struct CreateApiKeyResponse {
    /// The stored record.
    pub api_key: ApiKey,
    /// The plaintext key. Shown exactly once.
    pub key: String,
}

/// POST /v1/apikeys
pub async fn create_api_key(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Json(request): Json<CreateApiKeyRequest>,
) -> ApiResult<Json<CreateApiKeyResponse>> {
    if request.name.is_empty() {
        return Err(ApiError::invalid_argument("name is required"));
    }

    let plaintext = generate_token(DEFAULT_TOKEN_BYTES)?;
    let api_key = ApiKey {
        id: Uuid::new_v4(),
        user_id,
        name: request.name,
        key_prefix: key_prefix(&plaintext),
        key_digest: token_digest(&plaintext),
        scopes: request.scopes,
        expires_at: request
            .expires_in_secs
            .map(|secs| Utc::now() + Duration::seconds(secs)),
        revoked: false,
        last_used_at: None,
        created_at: Utc::now(),
    };
    state.store.insert_api_key(&api_key).await?;

    Ok(Json(CreateApiKeyResponse {
        api_key,
        key: plaintext,
    }))
}

// =============================================================================
// Validate
// =============================================================================

/// Validate request body.
#[derive(Debug, Deserialize)]
pub struct ValidateApiKeyRequest {
    /// The plaintext key to validate.
    pub key: String,
}

/// Validate response.
#[derive(Debug, Serialize)]
pub struct ValidateApiKeyResponse {
    /// Whether the key is live.
    pub valid: bool,
    /// Owning user, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    /// Scopes granted to the key, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

/// POST /v1/apikeys/validate
///
/// Public endpoint for relying services. A key is valid iff the digest
/// matches a non-revoked record that has not expired; both halves of
/// that contract are pinned by tests.
pub async fn validate_api_key(
    State(state): State<AppState>,
    Json(request): Json<ValidateApiKeyRequest>,
) -> ApiResult<Json<ValidateApiKeyResponse>> {
    if request.key.is_empty() {
        return Err(ApiError::invalid_argument("key is required"));
    }

    let digest = token_digest(&request.key);
    let invalid = ValidateApiKeyResponse {
        valid: false,
        user_id: None,
        scopes: None,
    };

    let key = match state.store.get_api_key_by_digest(&digest).await {
        Ok(key) => key,
        Err(StoreError::NotFound) => return Ok(Json(invalid)),
        Err(e) => return Err(e.into()),
    };
    if key.is_expired(Utc::now()) {
        return Ok(Json(invalid));
    }

    Ok(Json(ValidateApiKeyResponse {
        valid: true,
        user_id: Some(key.user_id),
        scopes: Some(key.scopes),
    }))
}

// =============================================================================
// List / revoke
// =============================================================================

/// GET /v1/apikeys
pub async fn list_api_keys(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
) -> ApiResult<Json<Vec<ApiKey>>> {
    let keys = state.store.list_api_keys_by_user(user_id).await?;
    Ok(Json(keys))
}

/// DELETE /v1/apikeys/{id}
pub async fn revoke_api_key(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Ack>> {
    let id = parse_id(&id, "api_key_id")?;

    let key = match state.store.get_api_key(id).await {
        Ok(key) => key,
        Err(StoreError::NotFound) => return Err(ApiError::not_found("API key not found")),
        Err(e) => return Err(e.into()),
    };
    if key.user_id != user_id {
        return Err(ApiError::permission_denied("API key belongs to another user"));
    }

    state.store.revoke_api_key(id).await?;
    Ok(Json(Ack::ok()))
}
