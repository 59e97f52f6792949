// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health handlers.

use axum::Json;
use serde::Serialize;

/// Health response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

/// Readiness response body.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Whether the service accepts traffic.
    pub ready: bool,
}

/// GET /ready
pub async fn ready() -> Json<ReadinessResponse> {
    Json(ReadinessResponse { ready: true })
}
