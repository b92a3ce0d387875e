//! Entity File Handlers
//!
//! Multipart upload with a content-type allow-list. Large non-image payloads
//! are gzip-compressed on disk and transparently decompressed on download;
//! images get a generated thumbnail.

use std::io::{Read, Write};
use std::path::PathBuf;

use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, Multipart, Path, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::audit::{AuditAction, create_snapshot};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::entity_file as file_repo;
use crate::utils::{AppError, AppResult};
use shared::models::{EntityFile, FileUploadResponse};

/// Maximum file size (100MB)
pub const MAX_FILE_SIZE: usize = 100 * 1024 * 1024;

/// Files above this size are gzip-compressed before storage (1MB)
const COMPRESSION_THRESHOLD: usize = 1024 * 1024;

/// Thumbnail bounding box (pixels)
const THUMBNAIL_SIZE: u32 = 256;

/// JPEG quality for thumbnails
const THUMBNAIL_QUALITY: u8 = 85;

/// Content types accepted for upload
const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "application/pdf",
    "text/plain",
    "text/csv",
    "application/json",
    "application/zip",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Entities that may own attachments
const ALLOWED_ENTITY_TYPES: &[&str] = &["case", "proposal", "project", "customer", "order"];

fn validate_entity_type(entity_type: &str) -> AppResult<()> {
    if !ALLOWED_ENTITY_TYPES.contains(&entity_type) {
        return Err(AppError::validation(format!(
            "Unknown entity type '{}'. Allowed: {}",
            entity_type,
            ALLOWED_ENTITY_TYPES.join(", ")
        )));
    }
    Ok(())
}

/// Resolve and validate the content type: the declared multipart type when
/// present, otherwise a guess from the file extension.
fn resolve_content_type(declared: Option<&str>, filename: &str) -> AppResult<String> {
    let content_type = match declared {
        Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => ct.to_string(),
        _ => mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    };

    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(AppError::validation(format!(
            "Content type '{}' is not allowed",
            content_type
        )));
    }
    Ok(content_type)
}

fn is_image(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

/// Already-compressed formats gain nothing from a second pass
fn is_compressible(content_type: &str) -> bool {
    !is_image(content_type) && content_type != "application/zip"
}

fn gzip_compress(data: &[u8]) -> AppResult<Vec<u8>> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| AppError::internal(format!("Compression failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| AppError::internal(format!("Compression failed: {e}")))
}

fn gzip_decompress(data: &[u8]) -> AppResult<Vec<u8>> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| AppError::internal(format!("Decompression failed: {e}")))?;
    Ok(decompressed)
}

/// Write a bounded-box JPEG thumbnail next to the uploads
fn write_thumbnail(data: &[u8], thumb_path: &PathBuf) -> AppResult<()> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::validation(format!("Invalid image: {e}")))?;
    let thumb = img.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE);

    let mut buffer = Vec::new();
    {
        let mut cursor = std::io::Cursor::new(&mut buffer);
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, THUMBNAIL_QUALITY);
        thumb
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|e| AppError::internal(format!("Failed to encode thumbnail: {e}")))?;
    }

    std::fs::write(thumb_path, &buffer)
        .map_err(|e| AppError::internal(format!("Failed to save thumbnail: {e}")))?;
    Ok(())
}

/// POST /api/files/entity/{entity_type}/{entity_id}
pub async fn upload(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path((entity_type, entity_id)): Path<(String, i64)>,
    mut multipart: Multipart,
) -> AppResult<Json<FileUploadResponse>> {
    validate_entity_type(&entity_type)?;

    let uploads_dir = state.config.uploads_dir();
    std::fs::create_dir_all(&uploads_dir)
        .map_err(|e| AppError::internal(format!("Failed to create uploads directory: {e}")))?;

    // Find the file field
    let mut field_data: Option<Vec<u8>> = None;
    let mut original_filename = None;
    let mut declared_type = None;

    while let Some(f) = multipart.next_field().await? {
        let name = f.name().map(|s| s.to_string());
        if name.as_deref() == Some("file") || name.as_deref() == Some("") {
            original_filename = f.file_name().map(|s| s.to_string());
            declared_type = f.content_type().map(|s| s.to_string());
            field_data = Some(f.bytes().await?.to_vec());
            break;
        }
    }

    let data = field_data.ok_or_else(|| {
        AppError::validation("No 'file' field found. Field name must be 'file'".to_string())
    })?;
    let filename = original_filename
        .ok_or_else(|| AppError::validation("No filename provided in file field".to_string()))?;

    if data.is_empty() {
        return Err(AppError::validation("Empty file provided".to_string()));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::validation(format!(
            "File too large ({} bytes). Maximum size is {}MB",
            data.len(),
            MAX_FILE_SIZE / 1024 / 1024
        )));
    }

    let content_type = resolve_content_type(declared_type.as_deref(), &filename)?;
    let size_bytes = data.len() as i64;

    let ext = PathBuf::from(&filename)
        .extension()
        .and_then(|e| e.to_str().map(|s| s.to_lowercase()))
        .unwrap_or_else(|| "bin".to_string());
    let file_id = Uuid::new_v4().to_string();

    // Thumbnail for images (non-fatal validation already done via allow-list)
    let mut has_thumbnail = false;
    if is_image(&content_type) {
        let thumb_path = state.config.thumbnails_dir().join(format!("{file_id}.jpg"));
        match write_thumbnail(&data, &thumb_path) {
            Ok(()) => has_thumbnail = true,
            Err(e) => {
                tracing::warn!(file = %filename, error = %e, "Thumbnail generation failed");
            }
        }
    }

    // Transparent compression above the threshold
    let compress = is_compressible(&content_type) && data.len() > COMPRESSION_THRESHOLD;
    let (stored_name, payload) = if compress {
        (format!("{file_id}.{ext}.gz"), gzip_compress(&data)?)
    } else {
        (format!("{file_id}.{ext}"), data)
    };

    let file_path = uploads_dir.join(&stored_name);
    std::fs::write(&file_path, &payload)
        .map_err(|e| AppError::internal(format!("Failed to save file: {e}")))?;

    let record = file_repo::insert(
        &state.pool,
        &entity_type,
        entity_id,
        &filename,
        &stored_name,
        &content_type,
        size_bytes,
        compress,
        has_thumbnail,
        Some(current_user.id),
    )
    .await?;

    let id = record.id.to_string();
    audit_log!(
        state.audit,
        AuditAction::FileUploaded,
        "entity_file",
        &id,
        operator_id = Some(current_user.id),
        operator_name = Some(current_user.display_name.clone()),
        details = create_snapshot(&record, "entity_file")
    );

    tracing::info!(
        original_name = %record.original_name,
        size = %record.size_bytes,
        compressed = %record.compressed,
        "File uploaded successfully"
    );

    let url = format!("/api/files/{}/download", record.id);
    Ok(Json(FileUploadResponse { file: record, url }))
}

/// GET /api/files/entity/{entity_type}/{entity_id}
pub async fn list_for_entity(
    State(state): State<ServerState>,
    Path((entity_type, entity_id)): Path<(String, i64)>,
) -> AppResult<Json<Vec<EntityFile>>> {
    validate_entity_type(&entity_type)?;
    let files = file_repo::find_by_entity(&state.pool, &entity_type, entity_id).await?;
    Ok(Json(files))
}

/// GET /api/files/{id}/download (decompresses transparently)
pub async fn download(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let record = file_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("File {} not found", id)))?;

    let file_path = state.config.uploads_dir().join(&record.stored_name);
    let raw = tokio::fs::read(&file_path)
        .await
        .map_err(|e| AppError::internal(format!("Failed to read file: {e}")))?;

    let content = if record.compressed {
        gzip_decompress(&raw)?
    } else {
        raw
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&record.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    let disposition = format!("attachment; filename=\"{}\"", record.original_name);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    Ok((headers, Body::from(content)))
}

/// GET /api/files/{id}/thumbnail
pub async fn thumbnail(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let record = file_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("File {} not found", id)))?;

    if !record.has_thumbnail {
        return Err(AppError::not_found(format!(
            "File {} has no thumbnail",
            id
        )));
    }

    // Thumbnails are keyed by the stored name's uuid stem
    let stem = record
        .stored_name
        .split('.')
        .next()
        .unwrap_or(&record.stored_name);
    let thumb_path = state.config.thumbnails_dir().join(format!("{stem}.jpg"));
    let content = tokio::fs::read(&thumb_path)
        .await
        .map_err(|e| AppError::internal(format!("Failed to read thumbnail: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    Ok((headers, Body::from(content)))
}

/// DELETE /api/files/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let record = file_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("File {} not found", id)))?;

    let result = file_repo::delete(&state.pool, id).await?;
    if result {
        // On-disk cleanup is best-effort; the row is the source of truth
        let file_path = state.config.uploads_dir().join(&record.stored_name);
        if let Err(e) = std::fs::remove_file(&file_path) {
            tracing::warn!(path = %file_path.display(), error = %e, "Failed to remove stored file");
        }
        if record.has_thumbnail {
            let stem = record
                .stored_name
                .split('.')
                .next()
                .unwrap_or(&record.stored_name);
            let thumb_path = state.config.thumbnails_dir().join(format!("{stem}.jpg"));
            let _ = std::fs::remove_file(&thumb_path);
        }

        let id_str = id.to_string();
        audit_log!(
            state.audit,
            AuditAction::FileDeleted,
            "entity_file",
            &id_str,
            operator_id = Some(current_user.id),
            operator_name = Some(current_user.display_name.clone()),
            details = create_snapshot(&record, "entity_file")
        );
    }

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_round_trip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(100);
        let compressed = gzip_compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(gzip_decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn content_type_allow_list() {
        assert!(resolve_content_type(Some("application/pdf"), "a.pdf").is_ok());
        assert!(resolve_content_type(None, "report.csv").is_ok());
        assert!(resolve_content_type(Some("application/x-msdownload"), "a.exe").is_err());
        assert!(resolve_content_type(None, "a.exe").is_err());
    }

    #[test]
    fn compression_skips_already_compressed_formats() {
        assert!(is_compressible("application/pdf"));
        assert!(is_compressible("text/plain"));
        assert!(!is_compressible("image/png"));
        assert!(!is_compressible("application/zip"));
    }

    #[test]
    fn thumbnail_is_bounded_and_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();

        let mut png = Vec::new();
        let img = image::RgbImage::from_pixel(640, 480, image::Rgb([200, 30, 30]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let path = dir.path().join("thumb.jpg");
        write_thumbnail(&png, &path).unwrap();

        let thumb = image::open(&path).unwrap();
        assert!(thumb.width() <= THUMBNAIL_SIZE);
        assert!(thumb.height() <= THUMBNAIL_SIZE);
    }

    #[test]
    fn garbage_bytes_are_rejected_as_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thumb.jpg");
        assert!(write_thumbnail(b"not an image", &path).is_err());
    }
}
