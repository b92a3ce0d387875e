//! Shared types for Desk Server
//!
//! Data models and utilities shared between the server and API clients.
//! DB row types are feature-gated behind `db` so that pure API consumers
//! don't pull in sqlx.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
