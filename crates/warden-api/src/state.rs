// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use warden_auth::{AuthFlows, TokenManager};
use warden_rbac::Checker;
use warden_store::Store;

use crate::config::ApiConfig;

/// State container handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Auth orchestration.
    pub flows: AuthFlows,
    /// Policy checker.
    pub checker: Arc<Checker>,
    /// Durable store.
    pub store: Arc<dyn Store>,
}

impl AppState {
    /// Creates the state container.
    pub fn new(
        config: ApiConfig,
        flows: AuthFlows,
        checker: Arc<Checker>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            flows,
            checker,
            store,
        }
    }

    /// Returns the token manager.
    pub fn tokens(&self) -> &TokenManager {
        self.flows.token_manager()
    }
}
