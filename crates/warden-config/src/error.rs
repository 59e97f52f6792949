// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// I/O failure while reading the file.
    #[error("Failed to read {path}: {message}")]
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying failure.
        message: String,
    },

    /// The file content could not be parsed.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// The path being parsed.
        path: PathBuf,
        /// Parser diagnostics.
        message: String,
    },

    /// Serialization failure independent of a concrete file.
    #[error("Configuration deserialization failed: {message}")]
    Serialization {
        /// Parser diagnostics.
        message: String,
    },

    /// The file parsed but the contents are invalid.
    #[error("Invalid configuration: {message}")]
    Validation {
        /// What is wrong.
        message: String,
    },

    /// An override environment variable held an unusable value.
    #[error("Invalid environment variable {name}: {reason}")]
    InvalidEnvVar {
        /// Variable name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Unrecognized configuration file extension.
    #[error("Unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// The offending extension.
        format: String,
    },
}

impl ConfigError {
    /// Creates a file-not-found error.
    pub fn file_not_found(path: impl AsRef<Path>) -> Self {
        Self::FileNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates an I/O error.
    pub fn io(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Creates a parse error.
    pub fn parse(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an invalid-env-var error.
    pub fn invalid_env_var(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported-format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::validation("jwt secrets must differ");
        assert_eq!(err.to_string(), "Invalid configuration: jwt secrets must differ");

        let err = ConfigError::unsupported_format("ini");
        assert_eq!(err.to_string(), "Unsupported configuration format: ini");
    }
}
