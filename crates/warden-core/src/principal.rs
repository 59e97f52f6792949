// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The authenticated principal bound to a request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated subject of a request.
///
/// Built by the credential-verification pipeline and consumed by the RBAC
/// pipeline and handlers. Downstream code dispatches on the variant; there
/// is intentionally no shared interface beyond what authorization needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Principal {
    /// A user authenticated by a bearer access token.
    User {
        /// User identifier from the token subject.
        user_id: Uuid,
        /// Email carried in the token claims.
        email: String,
    },
    /// A user authenticated by a long-lived API key.
    ApiKey {
        /// Owning user of the key.
        user_id: Uuid,
        /// Scope names granted to the key.
        scopes: Vec<String>,
    },
    /// A service account authenticated by a service key.
    ServiceAccount {
        /// Service account identifier.
        service_account_id: Uuid,
    },
}

impl Principal {
    /// Returns the acting user id for user-backed principals.
    ///
    /// `None` for service accounts, which are authorized through their own
    /// role bindings.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Principal::User { user_id, .. } | Principal::ApiKey { user_id, .. } => Some(*user_id),
            Principal::ServiceAccount { .. } => None,
        }
    }

    /// Returns the service account id, if this is a service-account principal.
    pub fn service_account_id(&self) -> Option<Uuid> {
        match self {
            Principal::ServiceAccount {
                service_account_id,
            } => Some(*service_account_id),
            _ => None,
        }
    }

    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Principal::User { .. } => "user",
            Principal::ApiKey { .. } => "apikey",
            Principal::ServiceAccount { .. } => "service_account",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
