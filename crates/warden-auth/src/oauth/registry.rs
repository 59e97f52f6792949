// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Provider registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use warden_core::{Error, Result};

use super::OAuthProvider;

/// A concurrency-safe registry of OAuth providers.
///
/// Many readers, rare writer; registration happens at startup.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn OAuthProvider>>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider under its own name.
    pub fn register(&self, provider: Arc<dyn OAuthProvider>) {
        let name = provider.name().to_string();
        self.providers.write().insert(name, provider);
    }

    /// Looks up a provider by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn OAuthProvider>> {
        self.providers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("oauth provider {name:?} not registered")))
    }

    /// Returns the registered provider names.
    pub fn list(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.list())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::UserInfo;
    use async_trait::async_trait;

    struct FakeProvider;

    #[async_trait]
    impl OAuthProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn authorization_url(&self, state: &str, _redirect_uri: Option<&str>) -> String {
            format!("https://fake.example/authorize?state={state}")
        }

        async fn exchange_code(
            &self,
            _code: &str,
            _redirect_uri: Option<&str>,
        ) -> warden_core::Result<UserInfo> {
            Ok(UserInfo {
                provider_id: "f1".to_string(),
                email: "a@x.io".to_string(),
                name: "A".to_string(),
                avatar: None,
                email_verified: true,
                raw_claims: serde_json::Value::Null,
            })
        }
    }

    #[test]
    fn test_register_and_get() {
        let registry = ProviderRegistry::new();
        registry.register(Arc::new(FakeProvider));

        let provider = registry.get("fake").unwrap();
        assert_eq!(provider.name(), "fake");
        assert_eq!(registry.list(), vec!["fake".to_string()]);
    }

    #[test]
    fn test_unknown_provider_is_not_found() {
        let registry = ProviderRegistry::new();
        let err = registry.get("nope").unwrap_err();
        assert_eq!(err.code, warden_core::ErrorCode::NotFound);
    }
}
