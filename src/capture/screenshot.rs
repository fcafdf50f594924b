//! Screenshot decode boundary.
//!
//! The host hands over encoded bytes (usually PNG, sometimes as a
//! `data:image/png;base64,` URL straight from the browser). An empty buffer
//! is a capture failure; bytes that do not decode are a decode failure.
//! Decoding runs on the blocking pool so the caller's task can yield.

use crate::error::ExtractError;
use base64::Engine;
use image::DynamicImage;
use std::path::Path;

/// Reject rasters with no pixels before any OCR work starts.
pub fn ensure_not_empty(image: &DynamicImage) -> Result<(), ExtractError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ExtractError::Capture(format!(
            "screenshot is empty ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Decode encoded screenshot bytes. The format is sniffed from the bytes.
pub async fn decode_png_bytes(bytes: Vec<u8>) -> Result<DynamicImage, ExtractError> {
    if bytes.is_empty() {
        return Err(ExtractError::Capture("no image data".to_string()));
    }

    let start = std::time::Instant::now();
    let byte_count = bytes.len();
    let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| ExtractError::Decode(format!("decoder task failed: {}", e)))?
        .map_err(|e| ExtractError::Decode(e.to_string()))?;

    ensure_not_empty(&image)?;
    log::info!(
        "[CAPTURE] Decoded {} bytes → {}x{} in {}ms",
        byte_count,
        image.width(),
        image.height(),
        start.elapsed().as_millis()
    );
    Ok(image)
}

/// Decode a `data:image/...;base64,...` URL as produced by browser capture APIs.
pub async fn decode_data_url(data_url: &str) -> Result<DynamicImage, ExtractError> {
    let data_url = data_url.trim();
    if data_url.is_empty() {
        return Err(ExtractError::Capture("no screenshot data URL".to_string()));
    }

    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| ExtractError::Decode("data URL has no payload".to_string()))?;
    if !header.starts_with("data:image/") || !header.ends_with(";base64") {
        return Err(ExtractError::Decode(format!(
            "unsupported data URL header '{}'",
            header
        )));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ExtractError::Decode(format!("invalid base64: {}", e)))?;
    decode_png_bytes(bytes).await
}

/// Read and decode a screenshot file.
pub async fn load_screenshot(path: &Path) -> Result<DynamicImage, ExtractError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ExtractError::Capture(format!("{}: {}", path.display(), e)))?;
    decode_png_bytes(bytes).await
}
