use axum::{
    Json,
    extract::{Multipart, multipart::Field},
    http::{HeaderMap, header},
    response::Html,
};

use crate::config;
use crate::error::IntakeError;
use crate::intake::{self, ProcessedImage, UploadCandidate};
use crate::mock_backend::ApiError;

const STUDIO_HTML: &str = include_str!("../templates/studio.html");

pub async fn studio_page() -> Html<&'static str> {
    Html(STUDIO_HTML)
}

/// Runs the intake pipeline on a multipart `file` field.
pub async fn handle_image_intake(
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ProcessedImage>, ApiError> {
    let declared_size = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    let mut candidate = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                candidate = Some(read_upload(field, declared_size).await?);
                break;
            }
            Ok(None) => break,
            Err(err) => {
                return Err(ApiError::bad_request(format!("Failed to read form: {err}")));
            }
        }
    }

    let candidate = candidate.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    tracing::debug!(
        file = %candidate.file_name,
        media_type = %candidate.media_type,
        size = candidate.size(),
        "processing uploaded image"
    );

    let processed = tokio::task::spawn_blocking(move || intake::process_image_file(&candidate))
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "image intake task failed");
            ApiError::internal()
        })?
        .map_err(rejected)?;
    Ok(Json(processed))
}

/// Reads the file field chunk by chunk. The declared type is checked before
/// any bytes are read, and reading stops once the size limit is passed.
async fn read_upload(
    mut field: Field<'_>,
    declared_size: Option<u64>,
) -> Result<UploadCandidate, ApiError> {
    let file_name = field.file_name().unwrap_or("").to_string();
    let media_type = field
        .content_type()
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| intake::media_type_from_filename(&file_name).to_string());
    intake::validate_media_type(&media_type).map_err(rejected)?;

    let mut candidate = UploadCandidate::new(file_name, media_type, Vec::new());
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|err| ApiError::bad_request(format!("Failed to read file: {err}")))?
    {
        candidate.bytes.extend_from_slice(&chunk);
        if candidate.size() > config::MAX_FILE_SIZE {
            // The rest of the body is never read; the request length is the
            // best size estimate left.
            let size = declared_size.unwrap_or(0).max(candidate.size());
            tracing::debug!(file = %candidate.file_name, size, "upload over size limit");
            return Err(rejected(intake::too_large(size)));
        }
    }
    Ok(candidate)
}

fn rejected(err: IntakeError) -> ApiError {
    ApiError::bad_request(err.to_string())
}
