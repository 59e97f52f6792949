// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use warden_core::Principal;

use crate::error::ApiError;

// =============================================================================
// Principal extractor
// =============================================================================

/// Extracts the principal bound by the auth pipeline.
///
/// Rejects with 401 when no principal is present (public methods bind
/// none).
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or_else(|| ApiError::unauthenticated("authentication required"))
    }
}

// =============================================================================
// Acting user extractor
// =============================================================================

/// Extracts the acting user id for user-backed principals.
///
/// Service accounts are rejected: user-owned resources (API keys, the
/// profile, password changes) have no meaning for them.
pub struct ActingUser(pub Uuid);

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentPrincipal(principal) =
            CurrentPrincipal::from_request_parts(parts, state).await?;
        principal
            .user_id()
            .map(ActingUser)
            .ok_or_else(|| ApiError::permission_denied("user principal required"))
    }
}

// =============================================================================
// Client IP extractor
// =============================================================================

/// Extracts the client address for session records.
pub struct ClientIp(pub Option<String>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string());
        if let Some(ip) = forwarded {
            return Ok(ClientIp(Some(ip)));
        }

        let connect = parts
            .extensions
            .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());
        Ok(ClientIp(connect))
    }
}

/// Extracts the client user agent for session records.
pub struct UserAgent(pub Option<String>);

impl<S> FromRequestParts<S> for UserAgent
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let agent = parts
            .headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        Ok(UserAgent(agent))
    }
}

// =============================================================================
// Tests
// =============================================================================
