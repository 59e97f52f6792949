// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transport adaptation of the domain error taxonomy.
//!
//! Components produce [`warden_core::Error`] values; this module maps
//! them to HTTP statuses and a coded JSON body at the boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::ErrorCode;

/// Result type alias for handler operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ApiError
// =============================================================================

/// A domain error carried to the transport boundary.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ApiError(pub warden_core::Error);

impl ApiError {
    /// Creates an `Unauthenticated` error.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self(warden_core::Error::unauthenticated(message))
    }

    /// Creates a `PermissionDenied` error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self(warden_core::Error::permission_denied(message))
    }

    /// Creates a `NotFound` error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(warden_core::Error::not_found(message))
    }

    /// Creates an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self(warden_core::Error::invalid_argument(message))
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self(warden_core::Error::internal(message))
    }

    /// Creates an `Unimplemented` error.
    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self(warden_core::Error::unimplemented(message))
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.0.code {
            ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ErrorCode::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
            ErrorCode::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::Unimplemented => StatusCode::NOT_IMPLEMENTED,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<warden_core::Error> for ApiError {
    fn from(err: warden_core::Error) -> Self {
        Self(err)
    }
}

impl From<warden_store::StoreError> for ApiError {
    fn from(err: warden_store::StoreError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.0.code;

        if self.0.is_server_error() {
            tracing::error!(error = %self.0, code = code.as_str(), "server error");
        } else {
            tracing::debug!(error = %self.0, code = code.as_str(), "request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetails {
                code: code.as_str().to_string(),
                message: self.0.message,
            },
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Wire shape
// =============================================================================

/// JSON error envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error details.
    pub error: ErrorDetails,
}

/// Error details within the envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Taxonomy code, e.g. `"UNAUTHENTICATED"`.
    pub code: String,
    /// Client-safe message.
    pub message: String,
}

// =============================================================================
// Tests
// =============================================================================
