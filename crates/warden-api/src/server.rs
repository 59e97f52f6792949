// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server assembly.

use std::net::SocketAddr;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AuthLayer, MethodPolicy, RateLimitLayer, RbacLayer};
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The WARDEN API server.
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Creates a server over the given state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Builds the router with the full middleware pipeline.
    pub fn router(&self) -> Router {
        let rate_limit = RateLimitLayer::new(self.state.config.rate_limit.clone());
        let auth = AuthLayer::new(
            std::sync::Arc::new(self.state.tokens().clone()),
            self.state.store.clone(),
        )
        .with_default_public_methods();
        let rbac = RbacLayer::new(self.state.checker.clone(), MethodPolicy::defaults());

        // Rate limiting ahead of auth; auth strictly before RBAC.
        let pipeline = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(self.state.config.request_timeout))
            .layer(rate_limit)
            .layer(auth)
            .layer(rbac);

        Router::new()
            // Health (public)
            .route("/health", get(handlers::health))
            .route("/ready", get(handlers::ready))
            // Auth (public)
            .route("/v1/auth/register", post(handlers::register))
            .route("/v1/auth/login", post(handlers::login))
            .route("/v1/auth/logout", post(handlers::logout))
            .route("/v1/auth/refresh", post(handlers::refresh))
            .route("/v1/auth/verify-email", post(handlers::verify_email))
            .route("/v1/auth/reset-password", post(handlers::reset_password))
            .route("/v1/auth/oauth/{provider}/url", get(handlers::oauth_url))
            .route(
                "/v1/auth/oauth/{provider}/callback",
                post(handlers::oauth_callback),
            )
            // Users
            .route("/v1/users/me", get(handlers::current_user))
            .route("/v1/users/password", post(handlers::change_password))
            // API keys
            .route(
                "/v1/apikeys",
                get(handlers::list_api_keys).post(handlers::create_api_key),
            )
            .route("/v1/apikeys/{id}", axum::routing::delete(handlers::revoke_api_key))
            .route("/v1/apikeys/validate", post(handlers::validate_api_key))
            // Service accounts
            .route(
                "/v1/service-accounts",
                post(handlers::create_service_account),
            )
            .route(
                "/v1/service-accounts/{id}/status",
                put(handlers::set_service_account_status),
            )
            .route(
                "/v1/service-accounts/{id}/keys",
                get(handlers::list_service_account_keys)
                    .post(handlers::create_service_account_key),
            )
            .route(
                "/v1/service-accounts/{id}/keys/{key_id}",
                axum::routing::delete(handlers::revoke_service_account_key),
            )
            .route(
                "/v1/service-accounts/{id}/bindings",
                post(handlers::bind_service_account_role),
            )
            // RBAC (mutations guarded by the method policy)
            .route(
                "/v1/rbac/roles",
                get(handlers::list_roles).post(handlers::create_role),
            )
            .route(
                "/v1/rbac/permissions",
                get(handlers::list_permissions).post(handlers::create_permission),
            )
            .route(
                "/v1/rbac/roles/{role_id}/permissions",
                post(handlers::assign_role_permission),
            )
            .route(
                "/v1/rbac/orgs/{org_id}/members/{user_id}",
                put(handlers::set_org_member).delete(handlers::remove_org_member),
            )
            .route("/v1/rbac/check", post(handlers::check_permission))
            // Pipeline and state
            .layer(pipeline)
            .with_state(self.state.clone())
    }

    /// Runs the server until the listener fails.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the server, draining in-flight requests when `shutdown`
    /// resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.state.config.socket_addr();
        let router = self.router();

        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("failed to bind: {e}")))?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ApiError::internal(format!("server error: {e}")))?;

        info!("API server shutdown complete");
        Ok(())
    }

    /// Returns the configured listen address.
    pub fn addr(&self) -> SocketAddr {
        self.state.config.socket_addr()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use warden_auth::{AuthFlows, ProviderRegistry, TokenManager, TokenManagerConfig};
    use warden_rbac::{Checker, PermissionCache, Resolver};
    use warden_store::MemoryStore;

    use crate::config::ApiConfig;

    fn test_state() -> AppState {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let tokens = TokenManager::new(TokenManagerConfig::new(
            "access-secret-long-enough-for-testing-00",
            "refresh-secret-long-enough-for-testing-0",
        ))
        .unwrap();
        let flows = AuthFlows::new(
            store.clone(),
            tokens,
            Arc::new(ProviderRegistry::new()),
        );
        let resolver = Resolver::new(store.clone(), Arc::new(PermissionCache::default()));
        AppState::new(
            ApiConfig::default(),
            flows,
            Arc::new(Checker::new(resolver)),
            store,
        )
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let server = ApiServer::new(test_state());
        let response = server
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_requires_credentials() {
        let server = ApiServer::new(test_state());
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/v1/users/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_scheme_rejected() {
        let server = ApiServer::new(test_state());
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/v1/users/me")
                    .header("authorization", "Token abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
