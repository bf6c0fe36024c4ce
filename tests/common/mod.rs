#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use ai_studio::cache::{HistoryCache, InMemoryStorage};
use ai_studio::intake::UploadCandidate;
use ai_studio::models::{Generation, Style};
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, RgbImage};

/// Noisy PNG so small sizes still produce a few kilobytes.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        let seed = x.wrapping_mul(2_654_435_761).wrapping_add(y.wrapping_mul(40_503));
        image::Rgb([(seed >> 3) as u8, (seed >> 11) as u8, (seed >> 19) as u8])
    });
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .unwrap();
    output
}

pub fn png_candidate(width: u32, height: u32) -> UploadCandidate {
    UploadCandidate::new("photo.png", "image/png", png_bytes(width, height))
}

pub fn memory_history() -> HistoryCache {
    HistoryCache::new(Arc::new(InMemoryStorage::new()))
}

pub fn generation(id: &str, style: Style) -> Generation {
    Generation {
        id: id.to_string(),
        image_url: "data:image/png;base64,AA==".to_string(),
        prompt: format!("prompt for {id}"),
        style,
        created_at: "2023-01-01T00:00:00.000Z".to_string(),
    }
}

pub fn json_request(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn multipart_request(
    uri: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Request<Body> {
    let boundary = "studio-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
