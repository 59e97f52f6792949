// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use warden_auth::flows::SessionClient;

use crate::error::ApiResult;
use crate::extractors::{ClientIp, UserAgent};
use crate::response::{Ack, AuthResponse, OAuthUrlResponse, RefreshResponse};
use crate::state::AppState;

// =============================================================================
// Register / login / logout
// =============================================================================

/// Register request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Display name.
    pub name: String,
}

/// POST /v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let outcome = state
        .flows
        .register(
            &request.email,
            &request.password,
            &request.name,
            SessionClient { ip, user_agent },
        )
        .await?;
    Ok(Json(AuthResponse::new(outcome.user, outcome.tokens)))
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let outcome = state
        .flows
        .login(
            &request.email,
            &request.password,
            SessionClient { ip, user_agent },
        )
        .await?;
    Ok(Json(AuthResponse::new(outcome.user, outcome.tokens)))
}

/// Logout / refresh request body.
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    /// The refresh token.
    pub refresh_token: String,
}

/// POST /v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> ApiResult<Json<Ack>> {
    state.flows.logout(&request.refresh_token).await?;
    Ok(Json(Ack::ok()))
}

/// POST /v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let tokens = state.flows.refresh(&request.refresh_token).await?;
    Ok(Json(RefreshResponse {
        tokens: tokens.into(),
    }))
}

// =============================================================================
// OAuth
// =============================================================================

/// Query parameters for the OAuth URL endpoint.
#[derive(Debug, Deserialize)]
pub struct OAuthUrlQuery {
    /// Redirect URI override.
    pub redirect_uri: Option<String>,
}

/// GET /v1/auth/oauth/{provider}/url
pub async fn oauth_url(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthUrlQuery>,
) -> ApiResult<Json<OAuthUrlResponse>> {
    let (authorization_url, oauth_state) = state
        .flows
        .oauth_url(&provider, query.redirect_uri.as_deref())
        .await?;
    Ok(Json(OAuthUrlResponse {
        authorization_url,
        state: oauth_state,
    }))
}

/// OAuth callback request body.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackRequest {
    /// Authorization code returned by the provider.
    pub code: String,
    /// Redirect URI override, when one was used for the consent URL.
    pub redirect_uri: Option<String>,
}

/// POST /v1/auth/oauth/{provider}/callback
pub async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    ClientIp(ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    Json(request): Json<OAuthCallbackRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let outcome = state
        .flows
        .oauth_callback(
            &provider,
            &request.code,
            request.redirect_uri.as_deref(),
            SessionClient { ip, user_agent },
        )
        .await?;
    Ok(Json(
        AuthResponse::new(outcome.user, outcome.tokens).with_is_new_user(outcome.is_new_user),
    ))
}

// =============================================================================
// Stubs
// =============================================================================

/// POST /v1/auth/verify-email
pub async fn verify_email() -> ApiResult<Json<Ack>> {
    Err(crate::error::ApiError::unimplemented(
        "email verification not yet implemented",
    ))
}

/// POST /v1/auth/reset-password
pub async fn reset_password() -> ApiResult<Json<Ack>> {
    Err(crate::error::ApiError::unimplemented(
        "password reset not yet implemented",
    ))
}
