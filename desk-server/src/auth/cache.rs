//! Permission Cache
//!
//! Per-instance cache of resolved user grants, bounding repeated user+role
//! lookups. Positive entries live ~5 minutes, negative lookups (unknown
//! username) ~30 seconds. Invalidation is manual (`refresh` endpoint) or
//! time-based expiry only, never pushed.

use std::sync::Arc;

use dashmap::DashMap;

use super::engine::UserGrants;

/// 正缓存 TTL（5 分钟）
const POSITIVE_TTL_MS: i64 = 5 * 60 * 1000;

/// 负缓存 TTL（30 秒）
const NEGATIVE_TTL_MS: i64 = 30 * 1000;

struct CacheEntry {
    /// None = cached negative lookup (username does not resolve)
    grants: Option<Arc<UserGrants>>,
    expires_at: i64,
}

/// 权限缓存（无锁并发，DashMap）
#[derive(Default)]
pub struct PermissionCache {
    entries: DashMap<String, CacheEntry>,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Outer None = cache miss (absent or expired).
    /// Inner None = cached negative lookup.
    pub fn get(&self, username: &str) -> Option<Option<Arc<UserGrants>>> {
        self.get_at(username, shared::util::now_millis())
    }

    pub(crate) fn get_at(&self, username: &str, now: i64) -> Option<Option<Arc<UserGrants>>> {
        match self.entries.get(username) {
            Some(entry) if entry.expires_at > now => Some(entry.grants.clone()),
            Some(_) => {
                // Expired: drop eagerly so the map doesn't accumulate
                drop(self.entries.remove(username));
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, username: &str, grants: Option<Arc<UserGrants>>) {
        self.insert_at(username, grants, shared::util::now_millis());
    }

    pub(crate) fn insert_at(&self, username: &str, grants: Option<Arc<UserGrants>>, now: i64) {
        let ttl = if grants.is_some() {
            POSITIVE_TTL_MS
        } else {
            NEGATIVE_TTL_MS
        };
        self.entries.insert(
            username.to_string(),
            CacheEntry {
                grants,
                expires_at: now + ttl,
            },
        );
    }

    /// Manual refresh for one user
    pub fn invalidate(&self, username: &str) {
        self.entries.remove(username);
    }

    /// Drop everything (admin escape hatch)
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permissions::PermissionSet;

    fn sample_grants() -> Arc<UserGrants> {
        Arc::new(UserGrants {
            user_id: 1,
            username: "alice".into(),
            display_name: "Alice".into(),
            is_active: true,
            role_grants: vec![PermissionSet::parse(Some("Cases:ReadOnly"))],
        })
    }

    #[test]
    fn positive_entries_expire_after_five_minutes() {
        let cache = PermissionCache::new();
        cache.insert_at("alice", Some(sample_grants()), 0);

        assert!(cache.get_at("alice", 1_000).is_some());
        assert!(cache.get_at("alice", POSITIVE_TTL_MS - 1).is_some());
        assert!(cache.get_at("alice", POSITIVE_TTL_MS).is_none());
    }

    #[test]
    fn negative_entries_expire_after_thirty_seconds() {
        let cache = PermissionCache::new();
        cache.insert_at("ghost", None, 0);

        assert!(matches!(cache.get_at("ghost", 1_000), Some(None)));
        assert!(cache.get_at("ghost", NEGATIVE_TTL_MS).is_none());
    }

    #[test]
    fn invalidate_is_immediate() {
        let cache = PermissionCache::new();
        cache.insert_at("alice", Some(sample_grants()), 0);
        cache.invalidate("alice");
        assert!(cache.get_at("alice", 1).is_none());
    }
}
