// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 50051;

// =============================================================================
// WardenConfig
// =============================================================================

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WardenConfig {
    /// Server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Claim-token settings.
    pub jwt: JwtConfig,
    /// OAuth providers by name (`google`, `github`, or any OIDC issuer).
    pub oauth_providers: HashMap<String, OAuthProviderConfig>,
    /// Rate limiting settings.
    pub rate_limit: RateLimitConfig,
    /// RBAC engine settings.
    pub rbac: RbacConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl WardenConfig {
    /// Validates cross-field invariants.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.url.is_empty() {
            return Err(ConfigError::validation("database.url is required"));
        }
        if self.jwt.access_secret.is_empty() || self.jwt.refresh_secret.is_empty() {
            return Err(ConfigError::validation(
                "jwt.access_secret and jwt.refresh_secret are required",
            ));
        }
        if self.jwt.access_secret == self.jwt.refresh_secret {
            return Err(ConfigError::validation(
                "jwt.access_secret and jwt.refresh_secret must be distinct",
            ));
        }
        if self.jwt.access_expiration_secs <= 0 || self.jwt.refresh_expiration_secs <= 0 {
            return Err(ConfigError::validation("jwt expirations must be positive"));
        }
        for (name, provider) in &self.oauth_providers {
            if provider.client_id.is_empty() || provider.client_secret.is_empty() {
                return Err(ConfigError::validation(format!(
                    "oauth provider {name:?} is missing client credentials"
                )));
            }
            if provider.redirect_url.is_empty() {
                return Err(ConfigError::validation(format!(
                    "oauth provider {name:?} is missing redirect_url"
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// ServerConfig
// =============================================================================

/// Network and lifecycle settings for the RPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub host: IpAddr,
    /// Listen port.
    pub port: u16,
    /// Deployment environment; affects logger verbosity only.
    pub environment: String,
    /// Per-request deadline in seconds.
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_timeout_secs: u64,
    /// Interval of the expired-session sweep, in seconds.
    pub session_sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: DEFAULT_PORT,
            environment: "development".to_string(),
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            session_sweep_interval_secs: 3600,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns `true` for production deployments.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

// =============================================================================
// DatabaseConfig
// =============================================================================

/// Durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Store URL. `memory://` selects the built-in in-process backend.
    pub url: String,
}

// =============================================================================
// JwtConfig
// =============================================================================

/// Claim-token settings. The two secrets must be independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Secret for access tokens.
    #[serde(skip_serializing)]
    pub access_secret: String,
    /// Secret for refresh tokens.
    #[serde(skip_serializing)]
    pub refresh_secret: String,
    /// Access token lifetime in seconds.
    pub access_expiration_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_expiration_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),  // Must be set by the operator
            refresh_secret: String::new(),
            access_expiration_secs: 900,      // 15 minutes
            refresh_expiration_secs: 604_800, // 7 days
        }
    }
}

// =============================================================================
// OAuthProviderConfig
// =============================================================================

/// Settings for one OAuth/OIDC provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OAuthProviderConfig {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    #[serde(skip_serializing)]
    pub client_secret: String,
    /// OIDC issuer URL. Defaults per provider when absent.
    pub issuer_url: Option<String>,
    /// Redirect URL registered with the provider.
    pub redirect_url: String,
    /// Requested scopes. Empty selects the provider default.
    pub scopes: Vec<String>,
}

// =============================================================================
// RateLimitConfig
// =============================================================================

/// Per-client rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether the limiter is mounted at all.
    pub enabled: bool,
    /// Sustained requests per second per client address.
    pub per_second: u32,
    /// Burst size per client address.
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_second: 100,
            burst: 200,
        }
    }
}

// =============================================================================
// RbacConfig
// =============================================================================

/// RBAC engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    /// Permission cache TTL in seconds.
    pub cache_ttl_secs: i64,
    /// Bound on the role-hierarchy ancestor walk.
    pub max_role_depth: usize,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            max_role_depth: 10,
        }
    }
}

// =============================================================================
// LoggingConfig
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> WardenConfig {
        let mut config = WardenConfig::default();
        config.database.url = "memory://".to_string();
        config.jwt.access_secret = "access-secret-long-enough-for-testing-00".to_string();
        config.jwt.refresh_secret = "refresh-secret-long-enough-for-testing-0".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = WardenConfig::default();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.jwt.access_expiration_secs, 900);
        assert_eq!(config.jwt.refresh_expiration_secs, 604_800);
        assert_eq!(config.rate_limit.per_second, 100);
        assert_eq!(config.rbac.cache_ttl_secs, 300);
        assert_eq!(config.rbac.max_role_depth, 10);
        assert!(!config.server.is_production());
    }

    #[test]
    fn test_validation_requires_database_url() {
        let mut config = valid_config();
        config.database.url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_requires_distinct_secrets() {
        let mut config = valid_config();
        config.jwt.refresh_secret = config.jwt.access_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_checks_provider_fields() {
        let mut config = valid_config();
        config.oauth_providers.insert(
            "google".to_string(),
            OAuthProviderConfig {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
                issuer_url: None,
                redirect_url: String::new(),
                scopes: Vec::new(),
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let mut config = valid_config();
        config.server.port = 9000;
        assert_eq!(config.server.socket_addr().port(), 9000);
    }
}
