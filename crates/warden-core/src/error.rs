// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Domain error taxonomy.
//!
//! Every subsystem produces [`Error`] values; the API boundary adapts them
//! to transport status codes. Error messages never carry credential
//! material or backend query text.

use thiserror::Error;

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// ErrorCode
// =============================================================================

/// Classification of a domain error, as surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Missing or invalid credential: bad signature, expired access token,
    /// unknown key, unknown or reused refresh session.
    Unauthenticated,
    /// Credential is valid but the principal may not perform the action.
    PermissionDenied,
    /// The referenced resource does not exist.
    NotFound,
    /// Unique-constraint collision (e.g. email already registered).
    AlreadyExists,
    /// Malformed input: bad UUID, empty required field.
    InvalidArgument,
    /// The operation cannot run in the resource's current state.
    FailedPrecondition,
    /// Per-client rate limit exceeded.
    ResourceExhausted,
    /// Declared but intentionally unimplemented surface.
    Unimplemented,
    /// Infrastructure fault: store failure, cryptographic failure.
    Internal,
}

impl ErrorCode {
    /// Returns the code as an upper snake-case string for response bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            ErrorCode::Unimplemented => "UNIMPLEMENTED",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

// =============================================================================
// Error
// =============================================================================

/// A domain error with a classification code and a client-safe message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Error {
    /// Error classification.
    pub code: ErrorCode,
    /// Client-safe message. Must not contain credential material.
    pub message: String,
}

impl Error {
    /// Creates an error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an `Unauthenticated` error.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, message)
    }

    /// Creates a `PermissionDenied` error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Creates a `NotFound` error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Creates an `AlreadyExists` error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyExists, message)
    }

    /// Creates an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    /// Creates a `FailedPrecondition` error.
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FailedPrecondition, message)
    }

    /// Creates a `ResourceExhausted` error.
    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceExhausted, message)
    }

    /// Creates an `Unimplemented` error.
    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unimplemented, message)
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Returns `true` if this error indicates an infrastructure fault that
    /// should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(self.code, ErrorCode::Internal)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let err = Error::unauthenticated("missing authorization header");
        assert_eq!(err.code, ErrorCode::Unauthenticated);
        assert_eq!(err.to_string(), "missing authorization header");

        let err = Error::already_exists("email already registered");
        assert_eq!(err.code, ErrorCode::AlreadyExists);
    }

    #[test]
    fn test_code_strings() {
        assert_eq!(ErrorCode::Unauthenticated.as_str(), "UNAUTHENTICATED");
        assert_eq!(ErrorCode::PermissionDenied.as_str(), "PERMISSION_DENIED");
        assert_eq!(ErrorCode::FailedPrecondition.as_str(), "FAILED_PRECONDITION");
    }

    #[test]
    fn test_server_error_classification() {
        assert!(Error::internal("store failure").is_server_error());
        assert!(!Error::not_found("user").is_server_error());
    }
}
