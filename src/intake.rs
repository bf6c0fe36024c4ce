//! Image intake: validation, preview, and the downscale decision that yields
//! the payload sent to the generation endpoint.

use std::path::Path;

use serde::Serialize;

use crate::config::{
    ACCEPTED_FORMATS, DOWNSCALE_JPEG_QUALITY, MAX_FILE_SIZE, MAX_IMAGE_DIMENSION,
};
use crate::error::IntakeError;
use crate::image_processing;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A file the user picked, held only for the duration of one upload.
#[derive(Clone, Debug)]
pub struct UploadCandidate {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedImage {
    pub preview: String,
    pub transfer_payload: String,
    pub was_downscaled: bool,
}

impl UploadCandidate {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, declaring its media type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, IntakeError> {
        let bytes = std::fs::read(path).map_err(|err| {
            IntakeError::UnreadableFile(format!("Failed to read file: {err}"))
        })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let media_type = media_type_from_filename(&file_name).to_string();
        Ok(Self {
            file_name,
            media_type,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

pub fn media_type_from_filename(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Type check first, then size. Neither looks at the pixel data.
pub fn validate_file(candidate: &UploadCandidate) -> Result<(), IntakeError> {
    validate_media_type(&candidate.media_type)?;
    validate_size(candidate.size())
}

pub fn validate_media_type(media_type: &str) -> Result<(), IntakeError> {
    if ACCEPTED_FORMATS.contains(&media_type) {
        Ok(())
    } else {
        Err(IntakeError::InvalidType {
            media_type: media_type.to_string(),
        })
    }
}

pub fn validate_size(size: u64) -> Result<(), IntakeError> {
    if size > MAX_FILE_SIZE {
        Err(too_large(size))
    } else {
        Ok(())
    }
}

pub fn too_large(size: u64) -> IntakeError {
    IntakeError::TooLarge {
        size_mb: size as f64 / BYTES_PER_MB,
        max_mb: MAX_FILE_SIZE / (1024 * 1024),
    }
}

pub fn generate_preview(candidate: &UploadCandidate) -> String {
    image_processing::encode_data_uri(&candidate.media_type, &candidate.bytes)
}

pub fn process_image_file(candidate: &UploadCandidate) -> Result<ProcessedImage, IntakeError> {
    validate_file(candidate)?;

    let preview = generate_preview(candidate);
    let (width, height) = image_processing::get_dimensions(&candidate.bytes, &candidate.media_type)
        .map_err(|err| IntakeError::UnreadableFile(format!("Failed to load image: {err}")))?;

    if !image_processing::needs_downscale(width, height, MAX_IMAGE_DIMENSION) {
        return Ok(ProcessedImage {
            transfer_payload: preview.clone(),
            preview,
            was_downscaled: false,
        });
    }

    let (jpeg, new_width, new_height) = image_processing::downscale_to_jpeg(
        &candidate.bytes,
        &candidate.media_type,
        MAX_IMAGE_DIMENSION,
        DOWNSCALE_JPEG_QUALITY,
    )
    .map_err(|err| IntakeError::UnreadableFile(format!("Failed to load image: {err}")))?;
    tracing::debug!(
        file = %candidate.file_name,
        width,
        height,
        new_width,
        new_height,
        "image downscaled for transfer"
    );

    Ok(ProcessedImage {
        preview,
        transfer_payload: image_processing::encode_data_uri("image/jpeg", &jpeg),
        was_downscaled: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let pixel = image::Rgba([200, 40, 90, 255]);
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, pixel));
        let image = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
            _ => image,
        };
        let mut output = Vec::new();
        image.write_to(&mut Cursor::new(&mut output), format).unwrap();
        output
    }

    fn candidate(media_type: &str, bytes: Vec<u8>) -> UploadCandidate {
        UploadCandidate::new("upload", media_type, bytes)
    }

    #[test]
    fn accepts_png_and_jpeg_types() {
        for media_type in ["image/png", "image/jpeg", "image/jpg"] {
            assert_eq!(validate_file(&candidate(media_type, b"test".to_vec())), Ok(()));
        }
    }

    #[test]
    fn rejects_other_types_before_checking_size() {
        let oversized = vec![0u8; (MAX_FILE_SIZE + 1) as usize];
        let err = validate_file(&candidate("text/plain", oversized)).unwrap_err();
        assert!(matches!(err, IntakeError::InvalidType { .. }));
        assert!(err.to_string().contains("Please select a PNG or JPG file"));
        assert!(err.to_string().ends_with("Selected: text/plain"));
    }

    #[test]
    fn size_limit_is_inclusive() {
        let at_limit = vec![0u8; MAX_FILE_SIZE as usize];
        assert_eq!(validate_file(&candidate("image/png", at_limit)), Ok(()));

        let over = vec![0u8; MAX_FILE_SIZE as usize + 1];
        let err = validate_file(&candidate("image/png", over)).unwrap_err();
        assert!(matches!(err, IntakeError::TooLarge { .. }));
    }

    #[test]
    fn size_check_stands_alone_for_streamed_uploads() {
        assert_eq!(validate_media_type("image/jpg"), Ok(()));
        assert!(matches!(
            validate_media_type("image/gif"),
            Err(IntakeError::InvalidType { .. })
        ));
        assert_eq!(validate_size(MAX_FILE_SIZE), Ok(()));
        assert_eq!(
            validate_size(13 * 1024 * 1024).unwrap_err().to_string(),
            "File too large (13.0MB). Maximum size is 10MB."
        );
    }

    #[test]
    fn eleven_megabyte_jpeg_is_too_large() {
        let bytes = vec![0u8; 11 * 1024 * 1024];
        let err = process_image_file(&candidate("image/jpeg", bytes)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "File too large (11.0MB). Maximum size is 10MB."
        );
    }

    #[test]
    fn small_image_payload_equals_preview() {
        let bytes = encoded(640, 480, ImageFormat::Png);
        let processed = process_image_file(&candidate("image/png", bytes.clone())).unwrap();
        assert!(!processed.was_downscaled);
        assert_eq!(processed.transfer_payload, processed.preview);
        assert_eq!(
            processed.preview,
            image_processing::encode_data_uri("image/png", &bytes)
        );
    }

    #[test]
    fn exactly_max_dimension_is_not_downscaled() {
        let bytes = encoded(1920, 1080, ImageFormat::Jpeg);
        let processed = process_image_file(&candidate("image/jpeg", bytes)).unwrap();
        assert!(!processed.was_downscaled);
        assert_eq!(processed.transfer_payload, processed.preview);
    }

    #[test]
    fn oversized_image_is_reencoded_as_jpeg() {
        let bytes = encoded(1200, 2600, ImageFormat::Png);
        let processed = process_image_file(&candidate("image/png", bytes)).unwrap();
        assert!(processed.was_downscaled);
        assert!(processed.preview.starts_with("data:image/png;base64,"));
        assert!(processed.transfer_payload.starts_with("data:image/jpeg;base64,"));

        let (_, jpeg) = image_processing::decode_data_uri(&processed.transfer_payload).unwrap();
        let (width, height) = image_processing::get_dimensions(&jpeg, "image/jpeg").unwrap();
        assert_eq!(height, 1920);
        // 1920 * 1200 / 2600 = 886.15
        assert!((width as f64 - 886.15).abs() <= 1.0);
    }

    #[test]
    fn garbage_bytes_are_unreadable() {
        let garbage = candidate("image/png", b"not an image".to_vec());
        let err = process_image_file(&garbage).unwrap_err();
        assert!(matches!(err, IntakeError::UnreadableFile(_)));
    }

    #[test]
    fn media_type_follows_extension() {
        assert_eq!(media_type_from_filename("Photo.JPEG"), "image/jpeg");
        assert_eq!(media_type_from_filename("shot.png"), "image/png");
        assert_eq!(media_type_from_filename("notes.txt"), "application/octet-stream");
        assert_eq!(media_type_from_filename("README"), "application/octet-stream");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = UploadCandidate::from_path(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, IntakeError::UnreadableFile(_)));
    }
}
