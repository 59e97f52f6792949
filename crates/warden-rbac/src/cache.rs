// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission cache.
//!
//! A process-local map from `(principal, scope)` keys to permission-name
//! lists with a fixed TTL. Eviction is lazy on read; replacement is
//! last-writer-wins, which is safe because entries are materialized views
//! of persistent data.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// Default entry lifetime.
pub const DEFAULT_TTL_SECS: i64 = 300;

#[derive(Debug, Clone)]
struct CacheEntry {
    permissions: Vec<String>,
    expires_at: DateTime<Utc>,
}

/// Builds the cache key for a user in an optional org scope.
pub fn cache_key(user_id: Uuid, org_id: Option<Uuid>) -> String {
    match org_id {
        Some(org) => format!("user:{user_id}:org:{org}"),
        None => format!("user:{user_id}:global"),
    }
}

// =============================================================================
// PermissionCache
// =============================================================================

/// An in-memory permission cache with per-entry TTL.
#[derive(Debug)]
pub struct PermissionCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl PermissionCache {
    /// Creates a cache with the given entry TTL in seconds.
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Returns the cached permission names, or `None` when absent or
    /// expired. An entry expiring exactly now counts as expired.
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        let hit = match self.entries.get(key) {
            Some(entry) if Utc::now() < entry.expires_at => Some(entry.permissions.clone()),
            Some(_) => None,
            None => return None,
        };
        if hit.is_none() {
            self.entries.remove(key);
        }
        hit
    }

    /// Stores permission names under the key with a fresh TTL.
    pub fn set(&self, key: &str, permissions: Vec<String>) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                permissions,
                expires_at: Utc::now() + self.ttl,
            },
        );
    }

    /// Removes a single entry.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Removes every entry belonging to the user, in all scopes.
    pub fn invalidate_user(&self, user_id: Uuid) {
        let prefix = format!("user:{user_id}");
        self.entries.retain(|key, _| !key.starts_with(&prefix));
    }

    /// Number of live entries (expired entries may still be counted).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn set_with_expiry(&self, key: &str, permissions: Vec<String>, expires_at: DateTime<Utc>) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                permissions,
                expires_at,
            },
        );
    }
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_shapes() {
        let user = Uuid::new_v4();
        let org = Uuid::new_v4();

        assert_eq!(
            cache_key(user, Some(org)),
            format!("user:{user}:org:{org}")
        );
        assert_eq!(cache_key(user, None), format!("user:{user}:global"));
    }

    #[test]
    fn test_set_get_roundtrip() {
        let cache = PermissionCache::default();
        cache.set("k", vec!["org:read".to_string()]);

        assert_eq!(cache.get("k"), Some(vec!["org:read".to_string()]));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = PermissionCache::default();
        cache.set_with_expiry("k", vec!["org:read".to_string()], Utc::now());

        // expires_at == now counts as expired, and the read evicts it.
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_refreshes_value() {
        let cache = PermissionCache::default();
        cache.set("k", vec!["a:b".to_string()]);
        cache.set("k", vec!["c:d".to_string()]);

        assert_eq!(cache.get("k"), Some(vec!["c:d".to_string()]));
    }

    #[test]
    fn test_invalidate_user_is_prefix_scoped() {
        let cache = PermissionCache::default();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let org = Uuid::new_v4();

        cache.set(&cache_key(user, Some(org)), vec!["a:b".to_string()]);
        cache.set(&cache_key(user, None), vec!["a:b".to_string()]);
        cache.set(&cache_key(other, None), vec!["a:b".to_string()]);

        cache.invalidate_user(user);

        assert_eq!(cache.get(&cache_key(user, Some(org))), None);
        assert_eq!(cache.get(&cache_key(user, None)), None);
        assert!(cache.get(&cache_key(other, None)).is_some());
    }
}
