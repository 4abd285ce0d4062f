use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use prerna_http::AppError;

use crate::state::AppState;
use crate::utils::media::{ImageKind, UploadFolder};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

struct UploadedFile {
    content_type: Option<String>,
    bytes: Vec<u8>,
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::bad_request(err.body_text())
}

fn megabytes(bytes: usize) -> usize {
    bytes / (1024 * 1024)
}

/// Store an image. Review photos are public; catalog images need admin.
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file = None;
    let mut folder = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("folder") => {
                folder = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let folder: UploadFolder = folder
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|()| AppError::bad_request("Invalid upload folder"))?;

    if !folder.is_public() {
        state.guard.authorize(&headers)?;
    }

    let file = file.ok_or_else(|| AppError::bad_request("No file was uploaded"))?;

    let kind = file
        .content_type
        .as_deref()
        .and_then(ImageKind::from_mime)
        .ok_or_else(|| AppError::bad_request("Unsupported image format"))?;

    let max_bytes = state.settings.media.max_upload_bytes;
    if file.bytes.len() > max_bytes {
        return Err(AppError::bad_request(format!(
            "Image exceeds {}MB limit",
            megabytes(max_bytes)
        )));
    }

    let url = state
        .media
        .save(folder, kind, &file.bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(
        folder = folder.as_str(),
        size = file.bytes.len(),
        url = %url,
        "image uploaded"
    );
    Ok(Json(UploadResponse { url }))
}
