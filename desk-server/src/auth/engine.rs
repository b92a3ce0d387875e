//! Authorization Decision Engine
//!
//! A pure predicate over already-loaded user + role data. The surrounding
//! middleware resolves grants (through the permission cache) and fails
//! CLOSED on any lookup error.

use std::sync::Arc;

use sqlx::SqlitePool;

use super::permissions::{PAGE_ADMIN, PermissionSet};
use crate::db::repository::{RepoResult, user as user_repo};
use shared::models::PermissionLevel;

/// A user's resolved authorization state: active flag plus one permission
/// set per assigned active role.
#[derive(Debug, Clone)]
pub struct UserGrants {
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub is_active: bool,
    pub role_grants: Vec<PermissionSet>,
}

impl UserGrants {
    /// Allow/deny for a page at one of the allowed levels.
    ///
    /// Rules, in order:
    /// 1. Inactive user ⇒ deny, regardless of roles.
    /// 2. A role granting the Admin page at ANY level is the master key;
    ///    it grants every protected page. This is the one place that rule
    ///    lives.
    /// 3. Otherwise, any role granting (page, level ∈ allowed) suffices.
    pub fn can_access(&self, page: &str, allowed: &[PermissionLevel]) -> bool {
        if !self.is_active {
            return false;
        }
        self.role_grants
            .iter()
            .any(|set| set.grants_page(PAGE_ADMIN) || set.has_permission(page, allowed))
    }
}

/// Load a user's grants from the store. `Ok(None)` means no such username.
///
/// Only ACTIVE roles contribute grants; the user row's own active flag is
/// carried so `can_access` can deny inactive users outright.
pub async fn resolve_grants(
    pool: &SqlitePool,
    username: &str,
) -> RepoResult<Option<Arc<UserGrants>>> {
    let Some(user) = user_repo::find_by_username(pool, username).await? else {
        return Ok(None);
    };

    let roles = user_repo::roles_for_user(pool, user.id).await?;
    let role_grants = roles
        .into_iter()
        .map(|r| PermissionSet::new(r.permissions))
        .collect();

    Ok(Some(Arc::new(UserGrants {
        user_id: user.id,
        username: user.username,
        display_name: user.display_name,
        is_active: user.is_active,
        role_grants,
    })))
}

/// 当前用户上下文 (认证中间件注入)
///
/// # 示例
///
/// ```ignore
/// async fn handler(Extension(user): Extension<CurrentUser>) -> Json<()> {
///     if user.can_access("Cases", allowed_levels(PermissionLevel::FullControl)) {
///         // 有权限
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub grants: Arc<UserGrants>,
}

impl CurrentUser {
    pub fn can_access(&self, page: &str, allowed: &[PermissionLevel]) -> bool {
        self.grants.can_access(page, allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PermissionLevel::*;

    fn grants(active: bool, sets: &[&str]) -> UserGrants {
        UserGrants {
            user_id: 1,
            username: "tester".into(),
            display_name: "Tester".into(),
            is_active: active,
            role_grants: sets
                .iter()
                .map(|raw| PermissionSet::parse(Some(*raw)))
                .collect(),
        }
    }

    #[test]
    fn user_with_no_roles_is_denied_everything() {
        let g = grants(true, &[]);
        assert!(!g.can_access("Cases", &[ReadOnly, FullControl]));
        assert!(!g.can_access("Admin", &[FullControl]));
    }

    #[test]
    fn inactive_user_is_denied_despite_grants() {
        let g = grants(false, &["Admin:FullControl"]);
        assert!(!g.can_access("Cases", &[ReadOnly, FullControl]));
    }

    #[test]
    fn grants_union_across_roles() {
        let g = grants(true, &["Cases:ReadOnly", "Projects"]);
        assert!(g.can_access("Cases", &[ReadOnly, FullControl]));
        assert!(!g.can_access("Cases", &[FullControl]));
        assert!(g.can_access("Projects", &[FullControl]));
        assert!(!g.can_access("Orders", &[ReadOnly, FullControl]));
    }

    #[test]
    fn admin_page_is_a_master_key_at_any_level() {
        let g = grants(true, &["Admin:ReadOnly"]);
        assert!(g.can_access("Cases", &[FullControl]));
        assert!(g.can_access("Audit", &[ReadOnly, FullControl]));
        assert!(g.can_access("SlaConfiguration", &[FullControl]));
    }
}
