use std::io::Cursor;

use anyhow::{anyhow, Result};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader};

/// Target box for a downscale. Images already inside the box keep their size.
pub fn calculate_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let aspect_ratio = width as f64 / height as f64;
    if width > height {
        let scaled = (max_dimension as f64 / aspect_ratio).round() as u32;
        (max_dimension, scaled.max(1))
    } else {
        let scaled = (max_dimension as f64 * aspect_ratio).round() as u32;
        (scaled.max(1), max_dimension)
    }
}

pub fn needs_downscale(width: u32, height: u32, max_dimension: u32) -> bool {
    width > max_dimension || height > max_dimension
}

/// Reads the pixel dimensions from the image header without decoding pixels.
pub fn get_dimensions(bytes: &[u8], mime_type: &str) -> Result<(u32, u32)> {
    let format = resolve_format(bytes, mime_type)?;
    ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|err| anyhow!("decode image failed: {err}"))
}

/// Resizes into the `max_dimension` box and re-encodes as JPEG, whatever the
/// source format was. Returns the encoded bytes and the new dimensions.
pub fn downscale_to_jpeg(
    bytes: &[u8],
    mime_type: &str,
    max_dimension: u32,
    quality: u8,
) -> Result<(Vec<u8>, u32, u32)> {
    let format = resolve_format(bytes, mime_type)?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|err| anyhow!("decode image failed: {err}"))?;
    let (width, height) = calculate_dimensions(image.width(), image.height(), max_dimension);
    let resized = image.resize_exact(width, height, FilterType::Triangle).to_rgb8();

    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, quality)
        .encode_image(&resized)
        .map_err(|err| anyhow!("encode jpeg failed: {err}"))?;
    Ok((output, width, height))
}

pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime_type};base64,{payload}")
}

/// Splits a base64 data URI into its media type and raw bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("not a data uri"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data uri has no payload"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| anyhow!("data uri is not base64 encoded"))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| anyhow!("decode base64 failed: {err}"))?;
    Ok((mime_type.to_string(), bytes))
}

pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    None
}

pub fn mime_to_format(mime_type: &str) -> Result<ImageFormat> {
    match mime_type {
        "image/png" => Ok(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Ok(ImageFormat::Jpeg),
        _ => Err(anyhow!("unsupported mime type: {mime_type}")),
    }
}

// Content sniffing wins over the declared type, like a browser decoding an
// image element.
fn resolve_format(bytes: &[u8], mime_type: &str) -> Result<ImageFormat> {
    let detected = detect_mime_type(bytes).unwrap_or(mime_type);
    mime_to_format(detected)
}
