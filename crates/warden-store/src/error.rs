// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Store error types.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors produced by store backends.
///
/// Service code maps these to the domain taxonomy at the call site, where
/// the missing resource has a name worth reporting.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the lookup.
    #[error("record not found")]
    NotFound,

    /// A unique-key invariant was violated.
    #[error("unique constraint violated: {constraint}")]
    Conflict {
        /// The violated constraint, e.g. `users.email`.
        constraint: &'static str,
    },

    /// Backend fault.
    #[error("store backend error: {message}")]
    Backend {
        /// Description of the fault. Never includes query text.
        message: String,
    },
}

impl StoreError {
    /// Creates a conflict error for the named constraint.
    pub fn conflict(constraint: &'static str) -> Self {
        Self::Conflict { constraint }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

impl From<StoreError> for warden_core::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => warden_core::Error::not_found("record not found"),
            StoreError::Conflict { constraint } => {
                warden_core::Error::already_exists(format!("conflict on {constraint}"))
            }
            StoreError::Backend { message } => warden_core::Error::internal(message),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::ErrorCode;

    #[test]
    fn test_not_found_classification() {
        assert!(StoreError::NotFound.is_not_found());
        assert!(!StoreError::conflict("users.email").is_not_found());
    }

    #[test]
    fn test_domain_error_mapping() {
        let err: warden_core::Error = StoreError::NotFound.into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: warden_core::Error = StoreError::conflict("users.email").into();
        assert_eq!(err.code, ErrorCode::AlreadyExists);

        let err: warden_core::Error = StoreError::backend("connection reset").into();
        assert_eq!(err.code, ErrorCode::Internal);
    }
}
