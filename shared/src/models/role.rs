//! Role Model

use serde::{Deserialize, Serialize};

/// Access level attached to a page grant.
///
/// Legacy permission strings spell these exactly as the variant names
/// (`"Projects:ReadOnly"`); an entry without a level means FullControl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionLevel {
    ReadOnly,
    FullControl,
}

impl PermissionLevel {
    /// Parse a level token, case-insensitively. Unknown tokens yield None.
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("readonly") {
            Some(Self::ReadOnly)
        } else if token.eq_ignore_ascii_case("fullcontrol") {
            Some(Self::FullControl)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "ReadOnly",
            Self::FullControl => "FullControl",
        }
    }
}

/// A single (page, level) grant.
///
/// Page names are matched case-insensitively; the canonical casing is kept
/// as written so legacy strings round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePermission {
    pub page: String,
    pub level: PermissionLevel,
}

impl PagePermission {
    pub fn new(page: impl Into<String>, level: PermissionLevel) -> Self {
        Self {
            page: page.into(),
            level,
        }
    }
}

/// Role entity (RBAC 角色)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Typed page grants, stored as a JSON array. The legacy comma-separated
    /// permission string only exists at the API boundary.
    #[cfg_attr(feature = "db", sqlx(json))]
    pub permissions: Vec<PagePermission>,
    pub is_system: bool,
    pub is_active: bool,
}

/// Create role payload
///
/// Accepts either typed `permissions` or a legacy `permission_string`;
/// when both are present the typed form wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<PagePermission>,
    pub permission_string: Option<String>,
}

/// Update role payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<PagePermission>>,
    pub permission_string: Option<String>,
    pub is_active: Option<bool>,
}

/// Role response with the legacy string rendered alongside the typed grants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<PagePermission>,
    /// Serialized form for legacy clients (`"Admin:FullControl,Cases"`)
    pub permission_string: String,
    pub is_system: bool,
    pub is_active: bool,
}

/// Customer visibility scope attached to a role.
///
/// The storage form is a plain join table; an EMPTY coverage set means the
/// role sees ALL customers. That inversion lives only in
/// [`CoverageScope::from_customer_ids`]; everything downstream works with
/// the explicit variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "customer_ids")]
pub enum CoverageScope {
    AllCustomers,
    Customers(Vec<i64>),
}

impl CoverageScope {
    /// Build a scope from a role's stored coverage rows.
    pub fn from_customer_ids(ids: Vec<i64>) -> Self {
        if ids.is_empty() {
            Self::AllCustomers
        } else {
            Self::Customers(ids)
        }
    }

    /// Whether a given customer falls inside this scope.
    pub fn contains(&self, customer_id: i64) -> bool {
        match self {
            Self::AllCustomers => true,
            Self::Customers(ids) => ids.contains(&customer_id),
        }
    }
}

/// Replace-coverage payload (`PUT /api/roles/{id}/coverage`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageUpdate {
    /// Empty list = unrestricted (all customers)
    pub customer_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_coverage_means_all_customers() {
        let scope = CoverageScope::from_customer_ids(vec![]);
        assert_eq!(scope, CoverageScope::AllCustomers);
        assert!(scope.contains(1));
        assert!(scope.contains(987_654_321));
    }

    #[test]
    fn explicit_coverage_restricts() {
        let scope = CoverageScope::from_customer_ids(vec![7, 9]);
        assert!(scope.contains(7));
        assert!(!scope.contains(8));
    }

    #[test]
    fn level_parse_is_case_insensitive() {
        assert_eq!(
            PermissionLevel::parse("readonly"),
            Some(PermissionLevel::ReadOnly)
        );
        assert_eq!(
            PermissionLevel::parse("FULLCONTROL"),
            Some(PermissionLevel::FullControl)
        );
        assert_eq!(PermissionLevel::parse("Owner"), None);
    }
}
