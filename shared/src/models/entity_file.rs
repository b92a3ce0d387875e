//! Entity File Model
//!
//! Attachment metadata; binary content lives on disk under the work dir.

use serde::{Deserialize, Serialize};

/// Attachment metadata row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct EntityFile {
    pub id: i64,
    /// Owning aggregate ("case", "proposal", "project", "customer", "order")
    pub entity_type: String,
    pub entity_id: i64,
    pub original_name: String,
    /// Name on disk (uuid + extension, `.gz` suffix when compressed)
    pub stored_name: String,
    pub content_type: String,
    /// Original (uncompressed) size in bytes
    pub size_bytes: i64,
    pub compressed: bool,
    pub has_thumbnail: bool,
    pub uploaded_by: Option<i64>,
    pub created_at: i64,
}

/// Upload response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadResponse {
    pub file: EntityFile,
    pub url: String,
}
