//! Image uploads for politician portraits and party logos.

use aws_sdk_s3::primitives::ByteStream;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::RequestContext;
use crate::errors::AppError;
use crate::state::AppState;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// File extension for the accepted image types.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

pub fn object_key(user_id: Uuid, extension: &str) -> String {
    format!("images/{user_id}/{}.{extension}", Uuid::new_v4())
}

pub fn public_url(base: &str, key: &str) -> String {
    format!("{}/{key}", base.trim_end_matches('/'))
}

/// POST /api/uploads
/// Multipart form with one `file` field.
pub async fn handle_upload(
    State(state): State<AppState>,
    ctx: RequestContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let caller = ctx.require_user()?;
    let mut multipart = multipart?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let extension = image_extension(&content_type).ok_or_else(|| {
            AppError::invalid("file", format!("Unsupported image type '{content_type}'"))
        })?;
        let data: Bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
        if data.is_empty() {
            return Err(AppError::invalid("file", "Uploaded file is empty"));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::invalid("file", "Images must be 5 MiB or smaller"));
        }

        let key = object_key(caller.user_id, extension);
        let size = data.len();
        state
            .s3
            .put_object()
            .bucket(&state.config.s3_bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type.as_str())
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!(user_id = %caller.user_id, key = %key, size, "Uploaded image");
        return Ok(Json(UploadResponse {
            url: public_url(&state.config.public_asset_base_url, &key),
        }));
    }

    Err(AppError::invalid("file", "Missing 'file' field"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_raster_images_accepted() {
        assert_eq!(image_extension("image/png"), Some("png"));
        assert_eq!(image_extension("IMAGE/JPEG"), Some("jpg"));
        assert_eq!(image_extension("image/svg+xml"), None);
        assert_eq!(image_extension("application/pdf"), None);
        assert_eq!(image_extension(""), None);
    }

    #[test]
    fn test_keys_are_scoped_per_user() {
        let user = Uuid::new_v4();
        let key = object_key(user, "png");
        assert!(key.starts_with(&format!("images/{user}/")));
        assert!(key.ends_with(".png"));
        assert_ne!(key, object_key(user, "png"));
    }

    #[test]
    fn test_public_url_joins_without_double_slash() {
        assert_eq!(
            public_url("http://localhost:9000/civic/", "images/a.png"),
            "http://localhost:9000/civic/images/a.png"
        );
    }
}
