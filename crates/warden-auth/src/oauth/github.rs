// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! GitHub provider.
//!
//! GitHub does not publish OIDC discovery for its OAuth apps, so this
//! provider completes the plain OAuth2 code flow and reads the profile
//! from the REST API. When the profile hides the email, the user-emails
//! endpoint supplies the primary verified address. GitHub verifies email
//! addresses, so results are treated as verified.

use async_trait::async_trait;
use serde::Deserialize;

use warden_core::{Error, Result};

use super::{urlencode, OAuthProvider, ProviderSettings, UserInfo};

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_API_URL: &str = "https://api.github.com/user";
const USER_EMAILS_URL: &str = "https://api.github.com/user/emails";

// =============================================================================
// GitHubProvider
// =============================================================================

/// The GitHub OAuth2 provider.
pub struct GitHubProvider {
    settings: ProviderSettings,
    http: reqwest::Client,
}

impl GitHubProvider {
    /// Creates a new GitHub provider.
    pub fn new(mut settings: ProviderSettings) -> Result<Self> {
        if settings.scopes.is_empty() {
            settings.scopes = vec!["user:email".to_string(), "read:user".to_string()];
        }
        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .user_agent("warden")
            .build()
            .map_err(|e| Error::internal(format!("http client construction failed: {e}")))?;
        Ok(Self { settings, http })
    }

    fn redirect_url<'a>(&'a self, redirect_uri: Option<&'a str>) -> &'a str {
        match redirect_uri {
            Some(uri) if !uri.is_empty() => uri,
            _ => &self.settings.redirect_url,
        }
    }

    /// Fetches the primary verified email from the user-emails endpoint.
    async fn fetch_primary_email(&self, access_token: &str) -> Result<String> {
        let emails: Vec<GhEmail> = self
            .http
            .get(USER_EMAILS_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::internal(format!("github emails request failed: {e}")))?
            .json()
            .await
            .map_err(|e| Error::internal(format!("github emails response invalid: {e}")))?;

        if let Some(email) = emails.iter().find(|e| e.primary && e.verified) {
            return Ok(email.email.clone());
        }
        emails
            .first()
            .map(|e| e.email.clone())
            .ok_or_else(|| Error::unauthenticated("github account has no email"))
    }
}

#[async_trait]
impl OAuthProvider for GitHubProvider {
    fn name(&self) -> &str {
        "github"
    }

    fn authorization_url(&self, state: &str, redirect_uri: Option<&str>) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&redirect_uri={}&scope={}&state={}",
            urlencode(&self.settings.client_id),
            urlencode(self.redirect_url(redirect_uri)),
            urlencode(&self.settings.scopes.join(" ")),
            urlencode(state),
        )
    }

    async fn exchange_code(&self, code: &str, redirect_uri: Option<&str>) -> Result<UserInfo> {
        let response = self
            .http
            .post(TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_url(redirect_uri)),
            ])
            .send()
            .await
            .map_err(|e| Error::internal(format!("github token exchange failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::unauthenticated("authorization code rejected"));
        }

        let token: GhTokenResponse = response
            .json()
            .await
            .map_err(|e| Error::internal(format!("github token response invalid: {e}")))?;

        let user: GhUser = self
            .http
            .get(USER_API_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| Error::internal(format!("github user request failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::internal(format!("github user api error: {e}")))?
            .json()
            .await
            .map_err(|e| Error::internal(format!("github user response invalid: {e}")))?;

        let email = match user.email {
            Some(email) if !email.is_empty() => email,
            _ => self.fetch_primary_email(&token.access_token).await?,
        };
        let name = user.name.filter(|n| !n.is_empty()).unwrap_or_else(|| user.login.clone());

        Ok(UserInfo {
            provider_id: user.id.to_string(),
            email,
            name,
            avatar: user.avatar_url,
            email_verified: true,
            raw_claims: serde_json::json!({ "login": user.login, "id": user.id }),
        })
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GhTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GhUser {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhEmail {
    email: String,
    primary: bool,
    verified: bool,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider() -> GitHubProvider {
        GitHubProvider::new(ProviderSettings::new("gh-client", "secret", "https://x.io/cb"))
            .unwrap()
    }

    #[test]
    fn test_default_scopes() {
        let provider = test_provider();
        assert_eq!(provider.settings.scopes, vec!["user:email", "read:user"]);
    }

    #[test]
    fn test_authorization_url() {
        let provider = test_provider();
        let url = provider.authorization_url("xyz", None);

        assert!(url.starts_with("https://github.com/login/oauth/authorize?client_id=gh-client"));
        assert!(url.contains("scope=user%3Aemail%20read%3Auser"));
        assert!(url.contains("state=xyz"));
    }

    #[test]
    fn test_configured_scopes_kept() {
        let provider = GitHubProvider::new(
            ProviderSettings::new("c", "s", "https://x.io/cb")
                .with_scopes(vec!["repo".to_string()]),
        )
        .unwrap();
        assert_eq!(provider.settings.scopes, vec!["repo"]);
    }
}
