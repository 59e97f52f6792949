// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OAuth/OIDC provider federation.
//!
//! A small closed set of providers behind one trait: generic OIDC (any
//! discovery-compliant issuer) and GitHub (plain OAuth2 + REST profile
//! lookup). Dynamic dispatch at registry-lookup time; the cost is dwarfed
//! by the HTTPS round trips.

mod github;
mod oidc;
mod registry;

pub use github::GitHubProvider;
pub use oidc::{DiscoveryDocument, OidcProvider};
pub use registry::ProviderRegistry;

use std::time::Duration;

use async_trait::async_trait;

use warden_core::Result;

/// Default deadline for outbound provider calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Provider settings
// =============================================================================

/// Connection settings for a single provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// OAuth client id; also the expected ID-token audience for OIDC.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// OIDC issuer URL. Ignored by GitHub; defaulted per provider.
    pub issuer_url: Option<String>,
    /// Redirect URL registered with the provider.
    pub redirect_url: String,
    /// Requested scopes. Empty means the provider default.
    pub scopes: Vec<String>,
    /// Deadline for outbound calls to the provider.
    pub http_timeout: Duration,
}

impl ProviderSettings {
    /// Creates settings with the mandatory fields and defaults elsewhere.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            issuer_url: None,
            redirect_url: redirect_url.into(),
            scopes: Vec::new(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Sets the issuer URL.
    pub fn with_issuer(mut self, issuer_url: impl Into<String>) -> Self {
        self.issuer_url = Some(issuer_url.into());
        self
    }

    /// Sets the requested scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }
}

// =============================================================================
// UserInfo
// =============================================================================

/// Normalized user information returned by any provider.
#[derive(Debug, Clone)]
pub struct UserInfo {
    /// The subject identifier at the provider.
    pub provider_id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL, if any.
    pub avatar: Option<String>,
    /// Whether the provider asserts the email as verified.
    pub email_verified: bool,
    /// The raw claim set, for diagnostics.
    pub raw_claims: serde_json::Value,
}

// =============================================================================
// Provider trait
// =============================================================================

/// A pluggable OAuth/OIDC provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Returns the provider identifier, e.g. `"google"` or `"github"`.
    fn name(&self) -> &str;

    /// Builds the user-facing consent URL with `state` threaded through.
    ///
    /// A non-empty `redirect_uri` overrides the configured redirect URL.
    fn authorization_url(&self, state: &str, redirect_uri: Option<&str>) -> String;

    /// Completes the authorization-code flow and returns normalized
    /// user information.
    async fn exchange_code(&self, code: &str, redirect_uri: Option<&str>) -> Result<UserInfo>;
}

impl std::fmt::Debug for dyn OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthProvider").field("name", &self.name()).finish()
    }
}

/// Percent-encodes a query component. Covers the characters that appear in
/// client ids, redirect URLs, scopes, and state tokens.
pub(crate) fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urlencode() {
        assert_eq!(urlencode("abc-123_~."), "abc-123_~.");
        assert_eq!(urlencode("a b"), "a%20b");
        assert_eq!(
            urlencode("https://x.io/cb?x=1"),
            "https%3A%2F%2Fx.io%2Fcb%3Fx%3D1"
        );
    }

    #[test]
    fn test_settings_builder() {
        let settings = ProviderSettings::new("id", "secret", "https://x.io/cb")
            .with_issuer("https://accounts.google.com")
            .with_scopes(vec!["openid".to_string()]);

        assert_eq!(settings.issuer_url.as_deref(), Some("https://accounts.google.com"));
        assert_eq!(settings.scopes, vec!["openid"]);
        assert_eq!(settings.http_timeout, DEFAULT_HTTP_TIMEOUT);
    }
}
