//! Permission Definitions
//!
//! Page-based RBAC. Every protected API surface maps to a named page
//! ("Cases", "Admin", …) with an access level (ReadOnly / FullControl).
//!
//! ## 设计原则
//! - 角色持有类型化的 (page, level) 授权集合，存储为 JSON
//! - 旧版逗号分隔字符串（`"Admin:FullControl,Cases"`）只出现在序列化边界
//! - "Admin" 页面授权是全局主钥，由决策引擎统一处理（见 engine.rs）

use shared::models::{PagePermission, PermissionLevel};

/// Admin page: a grant here (at any level) is the master key
pub const PAGE_ADMIN: &str = "Admin";

/// All known pages (for write-time validation of role grants)
pub const ALL_PAGES: &[&str] = &[
    "Admin",
    "Users",
    "Customers",
    "Cases",
    "Proposals",
    "Projects",
    "Orders",
    "SlaConfiguration",
    "Audit",
    "Files",
    "Dashboard",
];

/// Validate a page name against the known list (case-insensitive)
pub fn is_valid_page(page: &str) -> bool {
    ALL_PAGES.iter().any(|p| p.eq_ignore_ascii_case(page))
}

/// 管理员角色默认授权（仅 Admin 主钥）
pub fn default_admin_permissions() -> Vec<PagePermission> {
    vec![PagePermission::new(PAGE_ADMIN, PermissionLevel::FullControl)]
}

/// 客服角色默认授权（日常支持 + CRM 页面）
pub fn default_agent_permissions() -> Vec<PagePermission> {
    ["Customers", "Cases", "Proposals", "Orders", "Files", "Dashboard"]
        .into_iter()
        .map(|page| PagePermission::new(page, PermissionLevel::FullControl))
        .collect()
}

/// 只读角色默认授权（除 Admin 外所有页面 ReadOnly）
pub fn default_viewer_permissions() -> Vec<PagePermission> {
    ALL_PAGES
        .iter()
        .filter(|p| **p != PAGE_ADMIN)
        .map(|page| PagePermission::new(*page, PermissionLevel::ReadOnly))
        .collect()
}

/// An ordered set of page grants for one role.
///
/// Ordering matters: when the same page appears twice, the FIRST entry wins,
/// matching the legacy string reader. Duplicates are not rejected at write
/// time either (open question, flagged in DESIGN.md).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    entries: Vec<PagePermission>,
}

impl PermissionSet {
    pub fn new(entries: Vec<PagePermission>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PagePermission] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the legacy comma-separated permission string.
    ///
    /// Format per entry: `Page` or `Page:Level`. A missing level means
    /// FullControl. Tokens are trimmed; malformed tokens (no page component,
    /// or an unrecognized level) are skipped, never an error. There is no
    /// escaping for pages containing `,` or `:`, a known representational
    /// limitation of the legacy format, preserved as documented behavior.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut entries = Vec::new();
        let Some(raw) = raw else {
            return Self { entries };
        };

        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            let (page, level) = match token.split_once(':') {
                Some((page, level_token)) => {
                    let Some(level) = PermissionLevel::parse(level_token.trim()) else {
                        continue;
                    };
                    (page.trim(), level)
                }
                None => (token, PermissionLevel::FullControl),
            };

            if page.is_empty() {
                continue;
            }

            entries.push(PagePermission::new(page, level));
        }

        Self { entries }
    }

    /// Serialize back to the legacy string form.
    ///
    /// FullControl entries are written bare (`"Cases"`), matching what
    /// legacy writers produced.
    pub fn to_permission_string(&self) -> String {
        self.entries
            .iter()
            .map(|p| match p.level {
                PermissionLevel::FullControl => p.page.clone(),
                PermissionLevel::ReadOnly => format!("{}:{}", p.page, p.level.as_str()),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// First grant for a page (case-insensitive); iteration stops at the
    /// first match, so a pathological duplicate entry is never consulted.
    pub fn find(&self, page: &str) -> Option<PermissionLevel> {
        self.entries
            .iter()
            .find(|p| p.page.eq_ignore_ascii_case(page))
            .map(|p| p.level)
    }

    /// Whether this set grants `page` at one of the allowed levels.
    pub fn has_permission(&self, page: &str, allowed: &[PermissionLevel]) -> bool {
        match self.find(page) {
            Some(level) => allowed.contains(&level),
            None => false,
        }
    }

    /// Whether the page is granted at any level
    pub fn grants_page(&self, page: &str) -> bool {
        self.find(page).is_some()
    }
}

impl From<Vec<PagePermission>> for PermissionSet {
    fn from(entries: Vec<PagePermission>) -> Self {
        Self::new(entries)
    }
}

/// Allowed-level expansion for a required minimum level.
///
/// A ReadOnly requirement is satisfied by either level; a FullControl
/// requirement only by FullControl.
pub fn allowed_levels(minimum: PermissionLevel) -> &'static [PermissionLevel] {
    match minimum {
        PermissionLevel::ReadOnly => &[PermissionLevel::ReadOnly, PermissionLevel::FullControl],
        PermissionLevel::FullControl => &[PermissionLevel::FullControl],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PermissionLevel::*;

    fn has(raw: &str, page: &str, allowed: &[PermissionLevel]) -> bool {
        PermissionSet::parse(Some(raw)).has_permission(page, allowed)
    }

    #[test]
    fn empty_string_grants_nothing() {
        assert!(!has("", "Projects", &[ReadOnly, FullControl]));
        assert!(!PermissionSet::parse(None).has_permission("Admin", &[FullControl]));
    }

    #[test]
    fn explicit_level_is_honored() {
        let raw = "Admin:FullControl,Projects:ReadOnly";
        assert!(has(raw, "Projects", &[ReadOnly]));
        assert!(!has(raw, "Projects", &[FullControl]));
        assert!(has(raw, "Admin", &[FullControl]));
    }

    #[test]
    fn legacy_entry_defaults_to_full_control() {
        assert!(has("Projects", "Projects", &[FullControl]));
    }

    #[test]
    fn page_match_is_case_insensitive() {
        assert!(has("admin", "Admin", &[FullControl]));
        assert!(has("PROJECTS:readonly", "Projects", &[ReadOnly]));
    }

    #[test]
    fn first_matching_entry_wins_on_duplicates() {
        // Pathological double listing: only the first entry is honored
        let raw = "Cases:ReadOnly,Cases:FullControl";
        assert!(has(raw, "Cases", &[ReadOnly]));
        assert!(!has(raw, "Cases", &[FullControl]));
    }

    #[test]
    fn malformed_tokens_are_skipped() {
        let set = PermissionSet::parse(Some(" ,:FullControl,Cases:Owner, Projects :ReadOnly,"));
        assert_eq!(set.entries().len(), 1);
        assert!(set.has_permission("Projects", &[ReadOnly]));
        assert!(!set.grants_page("Cases"));
    }

    #[test]
    fn tokens_are_trimmed() {
        assert!(has(" Cases , Audit:ReadOnly ", "Cases", &[FullControl]));
        assert!(has(" Cases , Audit:ReadOnly ", "Audit", &[ReadOnly]));
    }

    #[test]
    fn permission_string_round_trips() {
        let raw = "Admin,Projects:ReadOnly,Cases";
        let set = PermissionSet::parse(Some(raw));
        assert_eq!(set.to_permission_string(), raw);
    }

    #[test]
    fn allowed_levels_expansion() {
        assert_eq!(allowed_levels(ReadOnly), &[ReadOnly, FullControl]);
        assert_eq!(allowed_levels(FullControl), &[FullControl]);
    }

    #[test]
    fn page_validation_ignores_case() {
        assert!(is_valid_page("cases"));
        assert!(is_valid_page("Admin"));
        assert!(!is_valid_page("Billing"));
    }
}
