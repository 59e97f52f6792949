// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Runtime wiring.
//!
//! Builds the store, token manager, OAuth registry, RBAC engine, and API
//! server from loaded configuration, then drives them until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use warden_api::{ApiConfig, ApiServer, AppState, RateLimitConfig};
use warden_auth::oauth::{GitHubProvider, OidcProvider, ProviderSettings};
use warden_auth::{AuthFlows, ProviderRegistry, TokenManager, TokenManagerConfig};
use warden_config::WardenConfig;
use warden_rbac::{seed_defaults, Checker, PermissionCache, Resolver};
use warden_store::{MemoryStore, Store};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// Runtime
// =============================================================================

/// The assembled service.
pub struct Runtime {
    config: WardenConfig,
    state: AppState,
    flows: AuthFlows,
    run_sweeper: bool,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime").finish_non_exhaustive()
    }
}

impl Runtime {
    /// Builds the runtime from configuration.
    pub async fn build(config: WardenConfig, run_sweeper: bool) -> BinResult<Self> {
        let store = build_store(&config)?;
        seed_defaults(store.as_ref()).await?;

        let tokens = TokenManager::new(
            TokenManagerConfig::new(
                config.jwt.access_secret.clone(),
                config.jwt.refresh_secret.clone(),
            )
            .with_access_ttl_secs(config.jwt.access_expiration_secs)
            .with_refresh_ttl_secs(config.jwt.refresh_expiration_secs),
        )?;

        let providers = build_providers(&config).await?;
        let flows = AuthFlows::new(store.clone(), tokens, providers);

        let cache = Arc::new(PermissionCache::new(config.rbac.cache_ttl_secs));
        let resolver =
            Resolver::new(store.clone(), cache).with_max_depth(config.rbac.max_role_depth);
        let checker = Arc::new(Checker::new(resolver));

        let api_config = ApiConfig {
            host: config.server.host,
            port: config.server.port,
            rate_limit: RateLimitConfig {
                enabled: config.rate_limit.enabled,
                per_second: config.rate_limit.per_second,
                burst: config.rate_limit.burst,
            },
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
            shutdown_timeout: Duration::from_secs(config.server.shutdown_timeout_secs),
        };
        let state = AppState::new(api_config, flows.clone(), checker, store);

        Ok(Self {
            config,
            state,
            flows,
            run_sweeper,
        })
    }

    /// Runs the service until an OS shutdown signal arrives.
    pub async fn run(self) -> BinResult<()> {
        let coordinator = ShutdownCoordinator::new();

        if self.run_sweeper {
            spawn_session_sweeper(
                self.flows.clone(),
                Duration::from_secs(self.config.server.session_sweep_interval_secs),
                coordinator.clone(),
            );
        }

        let server = ApiServer::new(self.state);
        let signal = coordinator.shutdown_signal();

        let server_task = tokio::spawn(server.run_with_shutdown(signal));

        coordinator.wait_for_shutdown().await;
        info!("Draining in-flight requests");

        server_task
            .await
            .map_err(|e| BinError::runtime(format!("server task failed: {e}")))??;
        Ok(())
    }
}

// =============================================================================
// Wiring helpers
// =============================================================================

/// Builds the store from `database.url`.
///
/// The relational driver ships separately; this binary supports the
/// in-process backend selected by the `memory://` scheme.
fn build_store(config: &WardenConfig) -> BinResult<Arc<dyn Store>> {
    let url = &config.database.url;
    if url.starts_with("memory://") {
        info!("Using in-memory store backend");
        return Ok(Arc::new(MemoryStore::new()));
    }
    Err(BinError::config(format!(
        "unsupported database backend for {url:?}: this build includes the memory:// backend only"
    )))
}

/// Registers the configured OAuth providers.
async fn build_providers(config: &WardenConfig) -> BinResult<Arc<ProviderRegistry>> {
    let registry = Arc::new(ProviderRegistry::new());

    for (name, provider) in &config.oauth_providers {
        let mut settings = ProviderSettings::new(
            provider.client_id.clone(),
            provider.client_secret.clone(),
            provider.redirect_url.clone(),
        )
        .with_scopes(provider.scopes.clone());
        if let Some(issuer) = &provider.issuer_url {
            settings = settings.with_issuer(issuer.clone());
        }

        match name.as_str() {
            "github" => {
                registry.register(Arc::new(
                    GitHubProvider::new(settings).map_err(BinError::Domain)?,
                ));
            }
            "google" => {
                registry.register(Arc::new(
                    OidcProvider::google(settings)
                        .await
                        .map_err(BinError::Domain)?,
                ));
            }
            other => {
                registry.register(Arc::new(
                    OidcProvider::discover(other.to_string(), settings)
                        .await
                        .map_err(BinError::Domain)?,
                ));
            }
        }
        info!(provider = name, "oauth provider registered");
    }

    Ok(registry)
}

/// Periodically deletes expired sessions until shutdown.
fn spawn_session_sweeper(
    flows: AuthFlows,
    interval: Duration,
    coordinator: ShutdownCoordinator,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut shutdown = coordinator.subscribe();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = flows.sweep_expired_sessions().await {
                        warn!(error = %e, "session sweep failed");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> WardenConfig {
        let mut config = WardenConfig::default();
        config.database.url = "memory://".to_string();
        config.jwt.access_secret = "access-secret-long-enough-for-testing-00".to_string();
        config.jwt.refresh_secret = "refresh-secret-long-enough-for-testing-0".to_string();
        config
    }

    #[tokio::test]
    async fn test_build_with_memory_store() {
        let runtime = Runtime::build(test_config(), false).await.unwrap();
        assert_eq!(runtime.config.server.port, 50051);
    }

    #[tokio::test]
    async fn test_unsupported_backend_rejected() {
        let mut config = test_config();
        config.database.url = "postgres://localhost/warden".to_string();

        let err = Runtime::build(config, false).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
