//! Image byte handling
//!
//! Data URL parsing, remote image fetch, and the side-by-side raster
//! composition used by the compose flow.

use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;

/// Failures while decoding, fetching, or compositing image bytes.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Invalid image data URL")]
    InvalidDataUrl,

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to fetch image: {0}")]
    Fetch(String),

    #[error("Image processing failed: {0}")]
    Raster(String),
}

/// Decoded image bytes with their declared content type.
#[derive(Debug, Clone)]
pub struct DataUrl {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Parse a base64 `data:` URL into its content type and raw bytes.
///
/// Only the `data:<mime>;base64,<payload>` form is accepted. A missing
/// mime type falls back to `application/octet-stream`.
pub fn parse_data_url(input: &str) -> Result<DataUrl, MediaError> {
    let rest = input.strip_prefix("data:").ok_or(MediaError::InvalidDataUrl)?;
    let (header, encoded) = rest.split_once(',').ok_or(MediaError::InvalidDataUrl)?;
    if !header.ends_with(";base64") {
        return Err(MediaError::InvalidDataUrl);
    }

    let content_type = match header.split(';').next() {
        Some(mime) if !mime.is_empty() => mime.to_string(),
        _ => "application/octet-stream".to_string(),
    };

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| MediaError::Decode(e.to_string()))?;

    Ok(DataUrl {
        content_type,
        bytes: Bytes::from(bytes),
    })
}

/// File extension for a mime type, defaulting to `png`.
pub fn extension_for(content_type: &str) -> &str {
    content_type
        .split('/')
        .nth(1)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("png")
}

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads remote images for compositing.
///
/// Redirects are disabled: a URL that passed validation must not be able
/// to bounce the gateway onto an internal address.
pub struct MediaFetcher {
    http: reqwest::Client,
}

impl MediaFetcher {
    pub fn new() -> Result<Self, MediaError> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| MediaError::Fetch(e.to_string()))?;
        Ok(Self { http })
    }

    /// Fetch a remote image, returning its bytes and content type.
    pub async fn fetch(&self, url: &str) -> Result<DataUrl, MediaError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Fetch(format!("upstream returned {}", status)));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::Fetch(e.to_string()))?;

        Ok(DataUrl { content_type, bytes })
    }
}

/// Side length of each pane in the composed image.
const PANE: u32 = 400;
const JPEG_QUALITY: u8 = 90;

/// Compose two images side by side on a white canvas.
///
/// Each source is cover-cropped to a square pane, the first placed on
/// the left and the second on the right. The result is a JPEG twice as
/// wide as it is tall.
pub fn compose_side_by_side(person: &[u8], object: &[u8]) -> Result<Vec<u8>, MediaError> {
    let person = image::load_from_memory(person).map_err(|e| MediaError::Decode(e.to_string()))?;
    let object = image::load_from_memory(object).map_err(|e| MediaError::Decode(e.to_string()))?;

    let person = person.resize_to_fill(PANE, PANE, FilterType::Lanczos3);
    let object = object.resize_to_fill(PANE, PANE, FilterType::Lanczos3);

    let mut canvas = RgbImage::from_pixel(PANE * 2, PANE, Rgb([255, 255, 255]));
    imageops::overlay(&mut canvas, &person.to_rgb8(), 0, 0);
    imageops::overlay(&mut canvas, &object.to_rgb8(), i64::from(PANE), 0);

    encode_jpeg(&DynamicImage::ImageRgb8(canvas))
}

fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>, MediaError> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    image
        .write_with_encoder(encoder)
        .map_err(|e| MediaError::Raster(e.to_string()))?;
    Ok(buffer.into_inner())
}
