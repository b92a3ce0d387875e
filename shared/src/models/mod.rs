//! Data models
//!
//! Shared between desk-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod case;
pub mod customer;
pub mod dashboard;
pub mod entity_file;
pub mod order;
pub mod project;
pub mod proposal;
pub mod role;
pub mod sla;
pub mod user;

// Re-exports
pub use case::*;
pub use customer::*;
pub use dashboard::*;
pub use entity_file::*;
pub use order::*;
pub use project::*;
pub use proposal::*;
pub use role::*;
pub use sla::*;
pub use user::*;
