// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Policy checker.
//!
//! A thin façade over the resolver: resolve the effective permission set,
//! answer whether a named permission appears in it.

use uuid::Uuid;

use warden_core::Result;

use crate::resolver::Resolver;

/// Outcome of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the permission is granted.
    pub allowed: bool,
    /// Name of the role that granted the permission, when tracked.
    pub matched_role: Option<String>,
}

impl Decision {
    fn allow() -> Self {
        Self {
            allowed: true,
            matched_role: None,
        }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            matched_role: None,
        }
    }
}

// =============================================================================
// Checker
// =============================================================================

/// Answers allow/deny questions for principals.
#[derive(Debug, Clone)]
pub struct Checker {
    resolver: Resolver,
}

impl Checker {
    /// Creates a checker over the given resolver.
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    /// Checks whether a user holds `permission_name` in the given scope.
    pub async fn check(
        &self,
        user_id: Uuid,
        permission_name: &str,
        org_id: Option<Uuid>,
    ) -> Result<Decision> {
        let permissions = self
            .resolver
            .resolve_user_permissions(user_id, org_id)
            .await?;

        if permissions.iter().any(|p| p.name == permission_name) {
            Ok(Decision::allow())
        } else {
            Ok(Decision::deny())
        }
    }

    /// Checks whether a service account holds `permission_name`.
    pub async fn check_service_account(
        &self,
        service_account_id: Uuid,
        permission_name: &str,
        org_id: Option<Uuid>,
    ) -> Result<Decision> {
        let permissions = self
            .resolver
            .resolve_service_account_permissions(service_account_id, org_id)
            .await?;

        if permissions.iter().any(|p| p.name == permission_name) {
            Ok(Decision::allow())
        } else {
            Ok(Decision::deny())
        }
    }

    /// Drops every cached resolution for the user.
    pub fn invalidate_user(&self, user_id: Uuid) {
        self.resolver.cache().invalidate_user(user_id);
    }
}

// =============================================================================
// Tests
// =============================================================================
