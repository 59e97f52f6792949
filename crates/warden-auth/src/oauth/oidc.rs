// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Generic OIDC provider.
//!
//! Works with any discovery-compliant issuer (Google, Azure AD, Okta,
//! Auth0, Keycloak). The ID token returned by the code exchange is
//! verified against the issuer's JWKS with the configured client id as
//! audience; claims come from the verified token, not the userinfo
//! endpoint.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use warden_core::{Error, Result};

use super::{urlencode, OAuthProvider, ProviderSettings, UserInfo};

/// ID-token signature algorithms accepted from issuers.
const ALLOWED_ID_TOKEN_ALGS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::ES256,
    Algorithm::ES384,
];

// =============================================================================
// Discovery
// =============================================================================

/// The subset of the OIDC discovery document this provider needs.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryDocument {
    /// Issuer identifier, matched against ID-token `iss`.
    pub issuer: String,
    /// Consent endpoint.
    pub authorization_endpoint: String,
    /// Code-exchange endpoint.
    pub token_endpoint: String,
    /// Signing-key set endpoint.
    pub jwks_uri: String,
}

// =============================================================================
// OidcProvider
// =============================================================================

/// A provider backed by standard OIDC discovery.
pub struct OidcProvider {
    name: String,
    settings: ProviderSettings,
    discovery: DiscoveryDocument,
    http: reqwest::Client,
}

impl OidcProvider {
    /// Creates a provider by fetching the issuer's discovery document.
    pub async fn discover(name: impl Into<String>, settings: ProviderSettings) -> Result<Self> {
        let issuer = settings
            .issuer_url
            .clone()
            .ok_or_else(|| Error::invalid_argument("oidc provider requires issuer_url"))?;

        let http = build_client(&settings)?;
        let url = format!(
            "{}/.well-known/openid-configuration",
            issuer.trim_end_matches('/')
        );
        let discovery: DiscoveryDocument = http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::internal(format!("oidc discovery failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::internal(format!("oidc discovery failed: {e}")))?
            .json()
            .await
            .map_err(|e| Error::internal(format!("oidc discovery response invalid: {e}")))?;

        Ok(Self::from_discovery(name, settings, discovery))
    }

    /// Creates a provider preconfigured for Google.
    pub async fn google(mut settings: ProviderSettings) -> Result<Self> {
        if settings.issuer_url.is_none() {
            settings.issuer_url = Some("https://accounts.google.com".to_string());
        }
        Self::discover("google", settings).await
    }

    /// Creates a provider from an already-fetched discovery document.
    pub fn from_discovery(
        name: impl Into<String>,
        mut settings: ProviderSettings,
        discovery: DiscoveryDocument,
    ) -> Self {
        if settings.scopes.is_empty() {
            settings.scopes = vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ];
        }
        let http = build_client(&settings).unwrap_or_default();
        Self {
            name: name.into(),
            settings,
            discovery,
            http,
        }
    }

    /// Verifies an ID token against the issuer JWKS and extracts claims.
    async fn verify_id_token(&self, raw: &str) -> Result<(IdTokenClaims, serde_json::Value)> {
        let header = decode_header(raw).map_err(|_| Error::unauthenticated("invalid id_token"))?;
        if !ALLOWED_ID_TOKEN_ALGS.contains(&header.alg) {
            return Err(Error::unauthenticated("id_token algorithm not allowed"));
        }

        let jwks: JwkSet = self
            .http
            .get(&self.discovery.jwks_uri)
            .send()
            .await
            .map_err(|e| Error::internal(format!("jwks fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| Error::internal(format!("jwks response invalid: {e}")))?;

        let jwk = match header.kid.as_deref() {
            Some(kid) => jwks.find(kid),
            None => jwks.keys.first(),
        }
        .ok_or_else(|| Error::unauthenticated("no matching signing key for id_token"))?;

        let key = DecodingKey::from_jwk(jwk)
            .map_err(|_| Error::internal("issuer signing key unusable"))?;

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[&self.settings.client_id]);
        validation.set_issuer(&[&self.discovery.issuer]);

        let claims = decode::<IdTokenClaims>(raw, &key, &validation)
            .map_err(|_| Error::unauthenticated("id_token verification failed"))?
            .claims;
        let raw_claims = decode::<serde_json::Value>(raw, &key, &validation)
            .map(|d| d.claims)
            .unwrap_or(serde_json::Value::Null);

        Ok((claims, raw_claims))
    }

    fn redirect_url<'a>(&'a self, redirect_uri: Option<&'a str>) -> &'a str {
        match redirect_uri {
            Some(uri) if !uri.is_empty() => uri,
            _ => &self.settings.redirect_url,
        }
    }
}

#[async_trait]
impl OAuthProvider for OidcProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn authorization_url(&self, state: &str, redirect_uri: Option<&str>) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline",
            self.discovery.authorization_endpoint,
            urlencode(&self.settings.client_id),
            urlencode(self.redirect_url(redirect_uri)),
            urlencode(&self.settings.scopes.join(" ")),
            urlencode(state),
        )
    }

    async fn exchange_code(&self, code: &str, redirect_uri: Option<&str>) -> Result<UserInfo> {
        let response = self
            .http
            .post(&self.discovery.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_url(redirect_uri)),
                ("client_id", &self.settings.client_id),
                ("client_secret", &self.settings.client_secret),
            ])
            .send()
            .await
            .map_err(|e| Error::internal(format!("token exchange failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::unauthenticated("authorization code rejected"));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::internal(format!("token response invalid: {e}")))?;
        let id_token = token
            .id_token
            .ok_or_else(|| Error::unauthenticated("no id_token in token response"))?;

        let (claims, raw_claims) = self.verify_id_token(&id_token).await?;

        Ok(UserInfo {
            provider_id: claims.sub,
            email: claims.email.unwrap_or_default(),
            name: claims.name.unwrap_or_default(),
            avatar: claims.picture,
            email_verified: claims.email_verified.unwrap_or(false),
            raw_claims,
        })
    }
}

fn build_client(settings: &ProviderSettings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(settings.http_timeout)
        .build()
        .map_err(|e| Error::internal(format!("http client construction failed: {e}")))
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[allow(dead_code)]
    access_token: String,
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider() -> OidcProvider {
        let settings = ProviderSettings::new("client-1", "secret", "https://x.io/cb");
        let discovery = DiscoveryDocument {
            issuer: "https://accounts.google.com".to_string(),
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            jwks_uri: "https://www.googleapis.com/oauth2/v3/certs".to_string(),
        };
        OidcProvider::from_discovery("google", settings, discovery)
    }

    #[test]
    fn test_default_scopes_applied() {
        let provider = test_provider();
        assert_eq!(provider.settings.scopes, vec!["openid", "email", "profile"]);
    }

    #[test]
    fn test_authorization_url_threads_state() {
        let provider = test_provider();
        let url = provider.authorization_url("st4te", None);

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?response_type=code"));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("state=st4te"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fx.io%2Fcb"));
    }

    #[test]
    fn test_authorization_url_redirect_override() {
        let provider = test_provider();
        let url = provider.authorization_url("s", Some("https://other.io/cb"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fother.io%2Fcb"));

        // Empty override falls back to the configured redirect.
        let url = provider.authorization_url("s", Some(""));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fx.io%2Fcb"));
    }
}
