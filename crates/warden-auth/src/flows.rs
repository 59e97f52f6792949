// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication flows.
//!
//! Stitches the credential primitives, the claim-token manager, the OAuth
//! registry, and the session store into the write side of the service:
//! register, login, logout, refresh rotation with reuse detection, OAuth
//! sign-in, and password change.
//!
//! Every successful authentication ends with a persisted session, so
//! refresh rotation is always available afterwards.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use warden_core::{Error, Result, User, UserStatus};
use warden_store::{OAuthAccountStore, SessionStore, Store, StoreError, UserStore};

use crate::claims::TokenType;
use crate::jwt::{TokenManager, TokenPair};
use crate::oauth::ProviderRegistry;
use crate::password::{hash_password, verify_password};
use crate::token::{generate_token, token_digest};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// Outcomes
// =============================================================================

/// Client metadata recorded on the session, advisory.
#[derive(Debug, Clone, Default)]
pub struct SessionClient {
    /// Client address.
    pub ip: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

/// Result of a successful register or login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The authenticated user.
    pub user: User,
    /// Freshly minted token pair.
    pub tokens: TokenPair,
}

/// Result of a successful OAuth callback.
#[derive(Debug, Clone)]
pub struct OAuthOutcome {
    /// The signed-in (possibly just created) user.
    pub user: User,
    /// Freshly minted token pair.
    pub tokens: TokenPair,
    /// Whether this callback created the user.
    pub is_new_user: bool,
}

// =============================================================================
// AuthFlows
// =============================================================================

/// The authentication orchestrator.
#[derive(Clone)]
pub struct AuthFlows {
    store: Arc<dyn Store>,
    tokens: TokenManager,
    providers: Arc<ProviderRegistry>,
}

impl AuthFlows {
    /// Creates the orchestrator over a store, token manager, and registry.
    pub fn new(
        store: Arc<dyn Store>,
        tokens: TokenManager,
        providers: Arc<ProviderRegistry>,
    ) -> Self {
        Self {
            store,
            tokens,
            providers,
        }
    }

    /// Returns the token manager.
    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    /// Returns the provider registry.
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    // =========================================================================
    // Register / login / logout
    // =========================================================================

    /// Registers a new user with a password credential.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        client: SessionClient,
    ) -> Result<LoginOutcome> {
        if email.is_empty() || password.is_empty() || name.is_empty() {
            return Err(Error::invalid_argument(
                "email, password, and name are required",
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(Error::invalid_argument("password too short"));
        }

        match self.store.get_user_by_email(email).await {
            Ok(_) => return Err(Error::already_exists("email already registered")),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let digest = hash_password_blocking(password.to_string()).await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            avatar: None,
            email_verified: false,
            status: UserStatus::Active,
            password_digest: Some(digest),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_user(&user).await?;

        let tokens = self.tokens.mint(user.id, &user.email, None)?;
        self.persist_session(user.id, &tokens, &client).await?;

        info!(user_id = %user.id, "user registered");
        Ok(LoginOutcome { user, tokens })
    }

    /// Authenticates a user by email and password.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: SessionClient,
    ) -> Result<LoginOutcome> {
        if email.is_empty() || password.is_empty() {
            return Err(Error::invalid_argument("email and password are required"));
        }

        let user = match self.store.get_user_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(Error::not_found("user not found")),
            Err(e) => return Err(e.into()),
        };

        if user.status == UserStatus::Banned {
            return Err(Error::permission_denied("account is banned"));
        }
        let Some(digest) = user.password_digest.clone() else {
            return Err(Error::unauthenticated("this account uses OAuth login only"));
        };

        if !verify_password_blocking(password.to_string(), digest).await? {
            info!(user_id = %user.id, "password verification failed");
            return Err(Error::unauthenticated("invalid credentials"));
        }

        let tokens = self.tokens.mint(user.id, &user.email, None)?;
        self.persist_session(user.id, &tokens, &client).await?;

        Ok(LoginOutcome { user, tokens })
    }

    /// Revokes the session matching the presented refresh token.
    ///
    /// Best effort: revocation failures are logged, not surfaced.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        if refresh_token.is_empty() {
            return Err(Error::invalid_argument("refresh_token is required"));
        }
        let digest = token_digest(refresh_token);
        if let Err(e) = self.store.mark_revoked_by_digest(&digest).await {
            debug!(error = %e, "logout revocation failed");
        }
        Ok(())
    }

    // =========================================================================
    // Refresh rotation
    // =========================================================================

    /// Exchanges a refresh token for a new pair, rotating the session.
    ///
    /// Presenting an already-rotated token is treated as compromise: the
    /// whole family is revoked and the call fails.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        if refresh_token.is_empty() {
            return Err(Error::invalid_argument("refresh_token is required"));
        }

        let claims = self.tokens.verify(refresh_token, TokenType::Refresh)?;
        let user_id = claims
            .user_id()
            .map_err(|_| Error::unauthenticated("invalid subject in token"))?;

        let digest = token_digest(refresh_token);
        let session = match self.store.get_session_by_digest(&digest).await {
            Ok(session) => session,
            Err(StoreError::NotFound) => return Err(Error::unauthenticated("session not found")),
            Err(e) => return Err(e.into()),
        };

        if session.is_expired(Utc::now()) {
            return Err(Error::unauthenticated("session expired"));
        }

        // Atomic consume: the previous flag decides between rotation and
        // reuse. Two concurrent refreshes of one digest cannot both see
        // `false`.
        let was_revoked = self.store.mark_revoked_by_digest(&digest).await?;
        if was_revoked {
            warn!(
                family_id = %session.family_id,
                user_id = %session.user_id,
                "refresh token reuse detected, revoking family"
            );
            let _ = self.store.mark_revoked_by_family(session.family_id).await;
            return Err(Error::unauthenticated("token reuse detected"));
        }

        let tokens = self
            .tokens
            .mint(user_id, &claims.email, Some(session.family_id))?;
        self.persist_session(user_id, &tokens, &SessionClient::default())
            .await?;

        Ok(tokens)
    }

    // =========================================================================
    // OAuth
    // =========================================================================

    /// Returns the consent URL for a provider plus a fresh state token.
    ///
    /// The state is not persisted server-side; the caller echoes it back
    /// and verifies it on callback.
    pub async fn oauth_url(
        &self,
        provider_name: &str,
        redirect_uri: Option<&str>,
    ) -> Result<(String, String)> {
        if provider_name.is_empty() {
            return Err(Error::invalid_argument("provider is required"));
        }
        let provider = self.providers.get(provider_name)?;
        let state = generate_token(32)?;
        let url = provider.authorization_url(&state, redirect_uri);
        Ok((url, state))
    }

    /// Completes an OAuth sign-in.
    ///
    /// Links the external identity to an existing user by account row or
    /// by email, creating the user on first contact.
    pub async fn oauth_callback(
        &self,
        provider_name: &str,
        code: &str,
        redirect_uri: Option<&str>,
        client: SessionClient,
    ) -> Result<OAuthOutcome> {
        if provider_name.is_empty() || code.is_empty() {
            return Err(Error::invalid_argument("provider and code are required"));
        }

        let provider = self.providers.get(provider_name)?;
        let user_info = provider
            .exchange_code(code, redirect_uri)
            .await
            .map_err(|e| Error::unauthenticated(format!("oauth exchange failed: {e}")))?;

        let (user, is_new_user) = match self
            .store
            .get_oauth_account(provider_name, &user_info.provider_id)
            .await
        {
            Ok(account) => (self.store.get_user(account.user_id).await?, false),
            Err(StoreError::NotFound) => {
                if user_info.email.is_empty() {
                    return Err(Error::unauthenticated("provider returned no email"));
                }
                let (user, is_new) = match self.store.get_user_by_email(&user_info.email).await {
                    Ok(user) => (user, false),
                    Err(StoreError::NotFound) => {
                        let now = Utc::now();
                        let user = User {
                            id: Uuid::new_v4(),
                            email: user_info.email.clone(),
                            name: user_info.name.clone(),
                            avatar: user_info.avatar.clone(),
                            email_verified: user_info.email_verified,
                            status: UserStatus::Active,
                            password_digest: None,
                            created_at: now,
                            updated_at: now,
                        };
                        self.store.insert_user(&user).await?;
                        info!(user_id = %user.id, provider = provider_name, "user created from oauth");
                        (user, true)
                    }
                    Err(e) => return Err(e.into()),
                };
                let account = warden_core::OAuthAccount {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    provider: provider_name.to_string(),
                    provider_account_id: user_info.provider_id.clone(),
                    created_at: Utc::now(),
                };
                self.store.insert_oauth_account(&account).await?;
                (user, is_new)
            }
            Err(e) => return Err(e.into()),
        };

        if user.status == UserStatus::Banned {
            return Err(Error::permission_denied("account is banned"));
        }

        let tokens = self.tokens.mint(user.id, &user.email, None)?;
        self.persist_session(user.id, &tokens, &client).await?;

        Ok(OAuthOutcome {
            user,
            tokens,
            is_new_user,
        })
    }

    // =========================================================================
    // Password change
    // =========================================================================

    /// Changes a user's password and revokes every session they hold.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(Error::invalid_argument("password too short"));
        }

        let mut user = match self.store.get_user(user_id).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(Error::not_found("user not found")),
            Err(e) => return Err(e.into()),
        };
        let Some(digest) = user.password_digest.clone() else {
            return Err(Error::failed_precondition(
                "this account uses OAuth login only",
            ));
        };

        if !verify_password_blocking(current_password.to_string(), digest).await? {
            return Err(Error::unauthenticated("invalid credentials"));
        }

        user.password_digest = Some(hash_password_blocking(new_password.to_string()).await?);
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        let revoked = self.store.mark_revoked_by_user(user_id).await?;
        info!(user_id = %user_id, revoked, "password changed, sessions revoked");
        Ok(())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Deletes sessions past their hard expiry.
    pub async fn sweep_expired_sessions(&self) -> Result<usize> {
        let removed = self.store.delete_expired_sessions().await?;
        if removed > 0 {
            debug!(removed, "expired sessions swept");
        }
        Ok(removed)
    }

    async fn persist_session(
        &self,
        user_id: Uuid,
        tokens: &TokenPair,
        client: &SessionClient,
    ) -> Result<()> {
        let session = warden_core::Session {
            id: Uuid::new_v4(),
            user_id,
            refresh_digest: token_digest(&tokens.refresh),
            family_id: tokens.family_id,
            expires_at: tokens.refresh_expires_at,
            revoked: false,
            ip: client.ip.clone(),
            user_agent: client.user_agent.clone(),
            created_at: Utc::now(),
        };
        self.store.insert_session(&session).await?;
        Ok(())
    }
}

async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| Error::internal("password hashing task failed"))?
}

async fn verify_password_blocking(password: String, digest: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &digest))
        .await
        .map_err(|_| Error::internal("password verification task failed"))?
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use warden_core::ErrorCode;
    use warden_store::MemoryStore;

    use crate::jwt::TokenManagerConfig;
    use crate::oauth::{OAuthProvider, UserInfo};

    struct StubProvider {
        email: String,
        provider_id: String,
    }

    #[async_trait]
    impl OAuthProvider for StubProvider {
        fn name(&self) -> &str {
            "google"
        }

        fn authorization_url(&self, state: &str, _redirect_uri: Option<&str>) -> String {
            format!("https://accounts.google.com/o/oauth2/v2/auth?state={state}")
        }

        async fn exchange_code(
            &self,
            _code: &str,
            _redirect_uri: Option<&str>,
        ) -> Result<UserInfo> {
            Ok(UserInfo {
                provider_id: self.provider_id.clone(),
                email: self.email.clone(),
                name: "A".to_string(),
                avatar: None,
                email_verified: true,
                raw_claims: serde_json::Value::Null,
            })
        }
    }

    fn flows() -> AuthFlows {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenManager::new(TokenManagerConfig::new(
            "access-secret-long-enough-for-testing-00",
            "refresh-secret-long-enough-for-testing-0",
        ))
        .unwrap();
        let providers = Arc::new(ProviderRegistry::new());
        providers.register(Arc::new(StubProvider {
            email: "a@x.io".to_string(),
            provider_id: "g1".to_string(),
        }));
        AuthFlows::new(store, tokens, providers)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let flows = flows();
        let out = flows
            .register("a@x.io", "P@ssword!", "A", SessionClient::default())
            .await
            .unwrap();
        assert_eq!(out.user.email, "a@x.io");

        let out = flows
            .login("a@x.io", "P@ssword!", SessionClient::default())
            .await
            .unwrap();
        assert_eq!(out.user.email, "a@x.io");
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let flows = flows();
        flows
            .register("a@x.io", "P@ssword!", "A", SessionClient::default())
            .await
            .unwrap();

        let err = flows
            .register("a@x.io", "P@ssword!", "A", SessionClient::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let flows = flows();
        flows
            .register("a@x.io", "P@ssword!", "A", SessionClient::default())
            .await
            .unwrap();

        let err = flows
            .login("a@x.io", "wrong-password", SessionClient::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);

        let err = flows
            .login("missing@x.io", "whatever1", SessionClient::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_banned_user_cannot_login() {
        let flows = flows();
        let out = flows
            .register("a@x.io", "P@ssword!", "A", SessionClient::default())
            .await
            .unwrap();

        let mut user = out.user;
        user.status = UserStatus::Banned;
        flows.store.update_user(&user).await.unwrap();

        let err = flows
            .login("a@x.io", "P@ssword!", SessionClient::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_refresh_rotation_and_reuse_detection() {
        let flows = flows();
        let out = flows
            .register("a@x.io", "P@ssword!", "A", SessionClient::default())
            .await
            .unwrap();
        let p1 = out.tokens;

        // Rotation keeps the family.
        let p2 = flows.refresh(&p1.refresh).await.unwrap();
        assert_eq!(p2.family_id, p1.family_id);

        // Replaying the consumed token is reuse: family-wide revocation.
        let err = flows.refresh(&p1.refresh).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
        assert_eq!(err.to_string(), "token reuse detected");

        // The still-live rotation died with the family.
        let err = flows.refresh(&p2.refresh).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
    }

    #[tokio::test]
    async fn test_logout_consumes_session() {
        let flows = flows();
        let out = flows
            .register("a@x.io", "P@ssword!", "A", SessionClient::default())
            .await
            .unwrap();

        flows.logout(&out.tokens.refresh).await.unwrap();

        // The revoked session now trips reuse detection.
        let err = flows.refresh(&out.tokens.refresh).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
    }

    #[tokio::test]
    async fn test_oauth_first_contact_creates_user() {
        let flows = flows();

        let out = flows
            .oauth_callback("google", "code", None, SessionClient::default())
            .await
            .unwrap();
        assert!(out.is_new_user);
        assert!(out.user.email_verified);
        assert!(out.user.password_digest.is_none());

        // Second callback with the same provider id resolves to the same user.
        let again = flows
            .oauth_callback("google", "code", None, SessionClient::default())
            .await
            .unwrap();
        assert!(!again.is_new_user);
        assert_eq!(again.user.id, out.user.id);
    }

    #[tokio::test]
    async fn test_oauth_links_to_existing_email() {
        let flows = flows();
        let registered = flows
            .register("a@x.io", "P@ssword!", "A", SessionClient::default())
            .await
            .unwrap();

        let out = flows
            .oauth_callback("google", "code", None, SessionClient::default())
            .await
            .unwrap();
        assert!(!out.is_new_user);
        assert_eq!(out.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_oauth_unknown_provider() {
        let flows = flows();
        let err = flows.oauth_url("gitlab", None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_oauth_only_account_rejects_password_login() {
        let flows = flows();
        flows
            .oauth_callback("google", "code", None, SessionClient::default())
            .await
            .unwrap();

        let err = flows
            .login("a@x.io", "whatever1", SessionClient::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
        assert_eq!(err.to_string(), "this account uses OAuth login only");
    }

    #[tokio::test]
    async fn test_change_password_revokes_all_sessions() {
        let flows = flows();
        let first = flows
            .register("a@x.io", "P@ssword!", "A", SessionClient::default())
            .await
            .unwrap();
        let second = flows
            .login("a@x.io", "P@ssword!", SessionClient::default())
            .await
            .unwrap();

        flows
            .change_password(first.user.id, "P@ssword!", "N3w-Passw0rd")
            .await
            .unwrap();

        assert!(flows.refresh(&first.tokens.refresh).await.is_err());
        assert!(flows.refresh(&second.tokens.refresh).await.is_err());

        // The new password works; the old one does not.
        assert!(flows
            .login("a@x.io", "N3w-Passw0rd", SessionClient::default())
            .await
            .is_ok());
        assert!(flows
            .login("a@x.io", "P@ssword!", SessionClient::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_change_password_oauth_only_precondition() {
        let flows = flows();
        let out = flows
            .oauth_callback("google", "code", None, SessionClient::default())
            .await
            .unwrap();

        let err = flows
            .change_password(out.user.id, "anything1", "N3w-Passw0rd")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FailedPrecondition);
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_sessions() {
        let flows = flows();
        flows
            .register("a@x.io", "P@ssword!", "A", SessionClient::default())
            .await
            .unwrap();
        assert_eq!(flows.sweep_expired_sessions().await.unwrap(), 0);

        // Plant an already-expired session next to the live one.
        let expired = warden_core::Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            refresh_digest: "stale".to_string(),
            family_id: Uuid::new_v4(),
            expires_at: Utc::now() - chrono::Duration::seconds(1),
            revoked: false,
            ip: None,
            user_agent: None,
            created_at: Utc::now() - chrono::Duration::days(8),
        };
        flows.store.insert_session(&expired).await.unwrap();

        assert_eq!(flows.sweep_expired_sessions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_session_rejected_even_if_not_revoked() {
        let flows = flows();
        let user_id = Uuid::new_v4();

        // A valid refresh JWT whose server-side session has already passed
        // its hard expiry, with revoked still false.
        let pair = flows.tokens.mint(user_id, "a@x.io", None).unwrap();
        let session = warden_core::Session {
            id: Uuid::new_v4(),
            user_id,
            refresh_digest: token_digest(&pair.refresh),
            family_id: pair.family_id,
            expires_at: Utc::now() - chrono::Duration::seconds(1),
            revoked: false,
            ip: None,
            user_agent: None,
            created_at: Utc::now(),
        };
        flows.store.insert_session(&session).await.unwrap();

        let err = flows.refresh(&pair.refresh).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
        assert_eq!(err.to_string(), "session expired");
    }
}
