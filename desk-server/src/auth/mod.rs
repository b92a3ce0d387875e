//! Authentication & Authorization
//!
//! JWT 认证 + 页面权限模型（PermissionString 编解码、决策引擎、权限缓存）

pub mod cache;
pub mod engine;
pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permissions;

pub use cache::PermissionCache;
pub use engine::{CurrentUser, UserGrants};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::{require_auth, require_page};
pub use permissions::{PermissionSet, allowed_levels};
