// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Test environment and request helpers.
//!
//! [`TestEnv`] assembles the full service (memory store, seeded RBAC
//! hierarchy, token manager, stub OAuth provider, API router) and drives
//! it through `tower::ServiceExt::oneshot` without binding a socket.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use warden_api::{ApiConfig, ApiServer, AppState};
use warden_auth::oauth::{OAuthProvider, UserInfo};
use warden_auth::token::{generate_token, key_prefix, token_digest, DEFAULT_TOKEN_BYTES};
use warden_auth::{AuthFlows, ProviderRegistry, TokenManager, TokenManagerConfig};
use warden_core::{OrgMember, SaRoleBinding, ServiceAccount, ServiceAccountKey, ServiceAccountStatus};
use warden_rbac::{seed_defaults, Checker, PermissionCache, Resolver};
use warden_store::{
    MemoryStore, OrgMemberStore, RoleStore, SaRoleBindingStore, ServiceAccountKeyStore,
    ServiceAccountStore,
};

// =============================================================================
// Stub OAuth provider
// =============================================================================

/// A provider that exchanges any code for a fixed identity.
pub struct StubOAuthProvider {
    /// Provider name to register under.
    pub provider_name: String,
    /// Subject returned from every exchange.
    pub provider_id: String,
    /// Email returned from every exchange.
    pub email: String,
}

#[async_trait]
impl OAuthProvider for StubOAuthProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn authorization_url(&self, state: &str, _redirect_uri: Option<&str>) -> String {
        format!("https://stub.example/authorize?state={state}")
    }

    async fn exchange_code(
        &self,
        _code: &str,
        _redirect_uri: Option<&str>,
    ) -> warden_core::Result<UserInfo> {
        Ok(UserInfo {
            provider_id: self.provider_id.clone(),
            email: self.email.clone(),
            name: "Stubbed User".to_string(),
            avatar: None,
            email_verified: true,
            raw_claims: Value::Null,
        })
    }
}

// =============================================================================
// TestEnv
// =============================================================================

/// A fully wired service instance backed by the in-memory store.
pub struct TestEnv {
    /// The store, for direct setup and assertions.
    pub store: Arc<MemoryStore>,
    /// Auth orchestration.
    pub flows: AuthFlows,
    /// Policy checker.
    pub checker: Arc<Checker>,
    /// The assembled router.
    pub router: Router,
}

impl TestEnv {
    /// Builds a seeded environment with a stub `google` provider.
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        seed_defaults(store.as_ref()).await.unwrap();

        let tokens = TokenManager::new(TokenManagerConfig::new(
            "access-secret-long-enough-for-testing-00",
            "refresh-secret-long-enough-for-testing-0",
        ))
        .unwrap();

        let providers = Arc::new(ProviderRegistry::new());
        providers.register(Arc::new(StubOAuthProvider {
            provider_name: "google".to_string(),
            provider_id: "g1".to_string(),
            email: "oauth@x.io".to_string(),
        }));

        let flows = AuthFlows::new(store.clone(), tokens, providers);
        let resolver = Resolver::new(store.clone(), Arc::new(PermissionCache::default()));
        let checker = Arc::new(Checker::new(resolver));

        let state = AppState::new(
            ApiConfig::default(),
            flows.clone(),
            checker.clone(),
            store.clone(),
        );
        let router = ApiServer::new(state).router();

        Self {
            store,
            flows,
            checker,
            router,
        }
    }

    /// Sends a request and returns `(status, parsed JSON body)`.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(auth) = authorization {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    /// Registers a user and returns `(user_id, access, refresh)`.
    pub async fn register_user(&self, email: &str, password: &str) -> (Uuid, String, String) {
        let (status, body) = self
            .request(
                "POST",
                "/v1/auth/register",
                None,
                Some(json!({ "email": email, "password": password, "name": "Test" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");

        let user_id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();
        let access = body["tokens"]["access_token"].as_str().unwrap().to_string();
        let refresh = body["tokens"]["refresh_token"].as_str().unwrap().to_string();
        (user_id, access, refresh)
    }

    /// Makes the user a member of `org` carrying the named system role.
    pub async fn join_org_as(&self, user_id: Uuid, org_id: Uuid, role_name: &str) {
        let role = self
            .store
            .get_role_by_name(role_name, None)
            .await
            .expect("seeded role");
        self.store
            .add_org_member(&OrgMember {
                org_id,
                user_id,
                role_id: role.id,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    /// Creates a service account bound to the system `owner` role and
    /// returns a `ServiceKey` authorization header for it.
    ///
    /// Method-level permission checks run without an org scope, so only
    /// service accounts (whose bindings apply globally) can pass the
    /// guarded administrative mutations.
    pub async fn service_admin_auth(&self, org_id: Uuid) -> String {
        let owner = self.store.get_role_by_name("owner", None).await.unwrap();

        let account = ServiceAccount {
            id: Uuid::new_v4(),
            org_id,
            name: "test-admin".to_string(),
            description: None,
            status: ServiceAccountStatus::Active,
            created_at: Utc::now(),
        };
        self.store.insert_service_account(&account).await.unwrap();

        let plaintext = generate_token(DEFAULT_TOKEN_BYTES).unwrap();
        let key = ServiceAccountKey {
            id: Uuid::new_v4(),
            service_account_id: account.id,
            name: "test".to_string(),
            key_prefix: key_prefix(&plaintext),
            key_digest: token_digest(&plaintext),
            expires_at: None,
            revoked: false,
            last_used_at: None,
            created_at: Utc::now(),
        };
        self.store.insert_service_account_key(&key).await.unwrap();

        self.store
            .assign_sa_role(&SaRoleBinding {
                service_account_id: account.id,
                role_id: owner.id,
                org_id,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        format!("ServiceKey {plaintext}")
    }

    /// Formats a bearer authorization header value.
    pub fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }
}
