// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential-verification middleware.
//!
//! Multiplexes the three credential schemes on the `authorization`
//! header:
//!
//! - `Bearer <jwt>` — access claim token, verified by the token manager
//! - `ApiKey <opaque>` — user credential record, looked up by digest
//! - `ServiceKey <opaque>` — service-account record, looked up by digest
//!
//! On success the principal is bound into the request extensions; on
//! failure no handler runs. Methods on the public allowlist pass through
//! with no principal bound.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tower::{Layer, Service};

use warden_auth::{TokenManager, TokenType};
use warden_core::{Principal, ServiceAccountStatus};
use warden_store::{ApiKeyStore, ServiceAccountKeyStore, Store, StoreError};

use crate::error::ApiError;

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for credential verification.
#[derive(Clone)]
pub struct AuthLayer {
    tokens: Arc<TokenManager>,
    store: Arc<dyn Store>,
    public_methods: Arc<HashSet<String>>,
}

impl AuthLayer {
    /// Creates a new auth layer.
    pub fn new(tokens: Arc<TokenManager>, store: Arc<dyn Store>) -> Self {
        Self {
            tokens,
            store,
            public_methods: Arc::new(HashSet::new()),
        }
    }

    /// Sets the public-method allowlist. Entries are exact paths or
    /// prefixes ending in `*`.
    pub fn with_public_methods(mut self, methods: Vec<String>) -> Self {
        self.public_methods = Arc::new(methods.into_iter().collect());
        self
    }

    /// Adds the service's default public methods.
    pub fn with_default_public_methods(self) -> Self {
        self.with_public_methods(vec![
            "/health".to_string(),
            "/ready".to_string(),
            "/v1/auth/register".to_string(),
            "/v1/auth/login".to_string(),
            "/v1/auth/logout".to_string(),
            "/v1/auth/refresh".to_string(),
            "/v1/auth/verify-email".to_string(),
            "/v1/auth/reset-password".to_string(),
            "/v1/auth/oauth/*".to_string(),
            "/v1/apikeys/validate".to_string(),
        ])
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            tokens: self.tokens.clone(),
            store: self.store.clone(),
            public_methods: self.public_methods.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for credential verification.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    tokens: Arc<TokenManager>,
    store: Arc<dyn Store>,
    public_methods: Arc<HashSet<String>>,
}

impl<S> AuthMiddleware<S> {
    fn is_public_method(&self, path: &str) -> bool {
        if self.public_methods.contains(path) {
            return true;
        }
        for method in self.public_methods.iter() {
            if let Some(prefix) = method.strip_suffix('*') {
                if path.starts_with(prefix) {
                    return true;
                }
            }
        }
        false
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let tokens = self.tokens.clone();
        let store = self.store.clone();
        let is_public = self.is_public_method(req.uri().path());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Public methods pass with no principal bound.
            if is_public {
                return inner.call(req).await;
            }

            let header_value = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());

            let Some(authorization) = header_value else {
                return Ok(
                    ApiError::unauthenticated("missing authorization header").into_response()
                );
            };

            match authenticate(&tokens, &store, &authorization).await {
                Ok(principal) => {
                    req.extensions_mut().insert(principal);
                    inner.call(req).await
                }
                Err(e) => {
                    tracing::debug!(error = %e, "authentication failed");
                    Ok(e.into_response())
                }
            }
        })
    }
}

// =============================================================================
// Scheme dispatch
// =============================================================================

/// Resolves an `authorization` header value to a principal.
async fn authenticate(
    tokens: &TokenManager,
    store: &Arc<dyn Store>,
    authorization: &str,
) -> Result<Principal, ApiError> {
    if let Some(token) = authorization.strip_prefix("Bearer ") {
        let claims = tokens.verify(token, TokenType::Access)?;
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::unauthenticated("invalid user ID in token"))?;
        return Ok(Principal::User {
            user_id,
            email: claims.email,
        });
    }

    if let Some(key) = authorization.strip_prefix("ApiKey ") {
        let digest = warden_auth::token::token_digest(key);
        let api_key = match store.get_api_key_by_digest(&digest).await {
            Ok(key) => key,
            Err(StoreError::NotFound) => {
                return Err(ApiError::unauthenticated("invalid API key"))
            }
            Err(e) => return Err(e.into()),
        };
        if api_key.is_expired(Utc::now()) {
            return Err(ApiError::unauthenticated("API key expired"));
        }

        // Advisory timestamp; failures are swallowed.
        let touch_store = store.clone();
        let key_id = api_key.id;
        tokio::spawn(async move {
            if let Err(e) = touch_store.touch_api_key(key_id).await {
                tracing::debug!(error = %e, "api key touch failed");
            }
        });

        return Ok(Principal::ApiKey {
            user_id: api_key.user_id,
            scopes: api_key.scopes,
        });
    }

    if let Some(key) = authorization.strip_prefix("ServiceKey ") {
        let digest = warden_auth::token::token_digest(key);
        let (sa_key, account) = match store.get_service_account_key_by_digest(&digest).await {
            Ok(pair) => pair,
            Err(StoreError::NotFound) => {
                return Err(ApiError::unauthenticated("invalid service account key"))
            }
            Err(e) => return Err(e.into()),
        };
        if sa_key.is_expired(Utc::now()) {
            return Err(ApiError::unauthenticated("service account key expired"));
        }
        if account.status != ServiceAccountStatus::Active {
            return Err(ApiError::permission_denied("service account is disabled"));
        }

        let touch_store = store.clone();
        let key_id = sa_key.id;
        tokio::spawn(async move {
            if let Err(e) = touch_store.touch_service_account_key(key_id).await {
                tracing::debug!(error = %e, "service account key touch failed");
            }
        });

        return Ok(Principal::ServiceAccount {
            service_account_id: sa_key.service_account_id,
        });
    }

    Err(ApiError::unauthenticated("unsupported authorization scheme"))
}

// =============================================================================
// Tests
// =============================================================================
