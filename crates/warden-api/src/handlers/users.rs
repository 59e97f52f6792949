// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User self-service handlers.

use axum::{extract::State, Json};
use serde::Deserialize;

use warden_store::UserStore;

use crate::error::{ApiError, ApiResult};
use crate::extractors::ActingUser;
use crate::response::{Ack, UserBody};
use crate::state::AppState;

/// GET /v1/users/me
///
/// Returns the record of the bound principal's user. Cross-user access is
/// impossible by construction: the id comes from the credential, not the
/// request.
pub async fn current_user(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
) -> ApiResult<Json<UserBody>> {
    let user = state
        .store
        .get_user(user_id)
        .await
        .map_err(|_| ApiError::not_found("user not found"))?;
    Ok(Json(user.into()))
}

/// Change-password request body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password.
    pub current_password: String,
    /// New password.
    pub new_password: String,
}

/// POST /v1/users/password
///
/// On success every session of the user is revoked; clients must log in
/// again.
pub async fn change_password(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<Ack>> {
    state
        .flows
        .change_password(user_id, &request.current_password, &request.new_password)
        .await?;
    Ok(Json(Ack::ok()))
}
