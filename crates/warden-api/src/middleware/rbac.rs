// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! RBAC enforcement middleware.
//!
//! Consults a static method → permission map. Methods without an entry
//! pass through on authentication alone; methods with an entry require
//! the bound principal to hold the permission, via the policy checker.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use warden_core::Principal;
use warden_rbac::Checker;

use crate::error::ApiError;

// =============================================================================
// MethodPolicy
// =============================================================================

/// The static mapping from methods to required permissions.
///
/// Patterns have the form `"VERB /path"` or just `"/path"` (any verb);
/// the path part is exact or a prefix ending in `*`. Exact paths win
/// over prefixes. Methods without an entry require authentication only.
#[derive(Debug, Clone, Default)]
pub struct MethodPolicy {
    entries: Vec<PolicyEntry>,
}

#[derive(Debug, Clone)]
struct PolicyEntry {
    verb: Option<String>,
    path: String,
    prefix: bool,
    permission: String,
}

impl MethodPolicy {
    /// Creates an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a required permission for a method pattern.
    pub fn require(mut self, pattern: impl Into<String>, permission: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let (verb, path) = match pattern.split_once(' ') {
            Some((verb, path)) => (Some(verb.to_string()), path),
            None => (None, pattern.as_str()),
        };
        let (path, prefix) = match path.strip_suffix('*') {
            Some(prefix) => (prefix.to_string(), true),
            None => (path.to_string(), false),
        };
        self.entries.push(PolicyEntry {
            verb,
            path,
            prefix,
            permission: permission.into(),
        });
        self
    }

    /// The service's default policy: administrative mutations only, read
    /// surfaces pass on authentication alone.
    pub fn defaults() -> Self {
        Self::new()
            .require("POST /v1/rbac/roles", "role:create")
            .require("POST /v1/rbac/roles/*", "permission:assign")
            .require("PUT /v1/rbac/orgs/*", "role:assign")
            .require("DELETE /v1/rbac/orgs/*", "member:remove")
    }

    /// Returns the required permission for a request, if any.
    pub fn required_permission(&self, verb: &str, path: &str) -> Option<&str> {
        let matches = |entry: &&PolicyEntry| {
            entry.verb.as_deref().map_or(true, |v| v == verb)
                && if entry.prefix {
                    path.starts_with(entry.path.as_str())
                } else {
                    path == entry.path
                }
        };

        // Exact paths win over prefixes.
        if let Some(entry) = self.entries.iter().filter(|e| !e.prefix).find(matches) {
            return Some(&entry.permission);
        }
        self.entries
            .iter()
            .filter(|e| e.prefix)
            .find(matches)
            .map(|entry| entry.permission.as_str())
    }
}

// =============================================================================
// RbacLayer
// =============================================================================

/// Layer for RBAC enforcement.
#[derive(Clone)]
pub struct RbacLayer {
    checker: Arc<Checker>,
    policy: Arc<MethodPolicy>,
}

impl RbacLayer {
    /// Creates a new RBAC layer.
    pub fn new(checker: Arc<Checker>, policy: MethodPolicy) -> Self {
        Self {
            checker,
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for RbacLayer {
    type Service = RbacMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RbacMiddleware {
            inner,
            checker: self.checker.clone(),
            policy: self.policy.clone(),
        }
    }
}

// =============================================================================
// RbacMiddleware
// =============================================================================

/// Middleware for RBAC enforcement.
#[derive(Clone)]
pub struct RbacMiddleware<S> {
    inner: S,
    checker: Arc<Checker>,
    policy: Arc<MethodPolicy>,
}

impl<S> Service<Request<Body>> for RbacMiddleware<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let checker = self.checker.clone();
        let required = self
            .policy
            .required_permission(req.method().as_str(), req.uri().path())
            .map(|p| p.to_string());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // No requirement beyond authentication.
            let Some(permission) = required else {
                return inner.call(req).await;
            };

            let Some(principal) = req.extensions().get::<Principal>().cloned() else {
                return Ok(
                    ApiError::unauthenticated("authentication required").into_response()
                );
            };

            let decision = match &principal {
                Principal::User { user_id, .. } | Principal::ApiKey { user_id, .. } => {
                    checker.check(*user_id, &permission, None).await
                }
                Principal::ServiceAccount {
                    service_account_id,
                } => {
                    checker
                        .check_service_account(*service_account_id, &permission, None)
                        .await
                }
            };

            match decision {
                Ok(decision) if decision.allowed => inner.call(req).await,
                Ok(_) => {
                    tracing::warn!(
                        principal = principal.kind(),
                        permission = %permission,
                        "permission denied"
                    );
                    Ok(ApiError::permission_denied(format!(
                        "permission {permission:?} denied"
                    ))
                    .into_response())
                }
                Err(e) => {
                    Ok(ApiError::internal(format!("permission check failed: {e}"))
                        .into_response())
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_lookup() {
        let policy = MethodPolicy::defaults().require("/v1/special", "special:run");

        // Guarded mutations.
        assert_eq!(
            policy.required_permission("POST", "/v1/rbac/roles"),
            Some("role:create")
        );
        assert_eq!(
            policy.required_permission("POST", "/v1/rbac/roles/abc/permissions"),
            Some("permission:assign")
        );
        assert_eq!(
            policy.required_permission("PUT", "/v1/rbac/orgs/o/members/u"),
            Some("role:assign")
        );
        assert_eq!(
            policy.required_permission("DELETE", "/v1/rbac/orgs/o/members/u"),
            Some("member:remove")
        );

        // Verb-agnostic entry.
        assert_eq!(
            policy.required_permission("GET", "/v1/special"),
            Some("special:run")
        );

        // Read surfaces and everything else: authentication only.
        assert_eq!(policy.required_permission("GET", "/v1/rbac/roles"), None);
        assert_eq!(policy.required_permission("POST", "/v1/rbac/check"), None);
        assert_eq!(policy.required_permission("GET", "/v1/users/me"), None);
    }

    #[test]
    fn test_exact_wins_over_prefix() {
        let policy = MethodPolicy::new()
            .require("POST /v1/rbac/*", "rbac:manage")
            .require("POST /v1/rbac/check", "rbac:check");

        assert_eq!(
            policy.required_permission("POST", "/v1/rbac/check"),
            Some("rbac:check")
        );
        assert_eq!(
            policy.required_permission("POST", "/v1/rbac/roles"),
            Some("rbac:manage")
        );
    }
}
