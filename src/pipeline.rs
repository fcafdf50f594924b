//! Screenshot-to-listing pipeline.
//!
//! profile → crop title → OCR → classify → OCR full page → price →
//! crop description → OCR → classify → crop photo → result.
//!
//! One OCR session per run, held by an `EngineGuard` so it is released on
//! every exit path. Recognitions run one after another on that session.

use crate::capture;
use crate::error::ExtractError;
use crate::ocr::heuristics::{self, NOT_FOUND};
use crate::ocr::{EngineGuard, OcrEngine};
use crate::profiles::{ProfileRegistry, SiteProfile};
use base64::Engine;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Fields found on one listing screenshot.
///
/// Text fields hold `NOT_FOUND` when no candidate qualified.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub profile: String,
    pub title: String,
    pub price: String,
    pub description: String,
    pub photo: DynamicImage,
}

/// JSON-friendly view of an `ExtractionResult` for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub profile: String,
    pub title: String,
    pub price: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_data_url: Option<String>,
}

impl ExtractionResult {
    /// Photo encoded as PNG bytes.
    pub fn photo_png_bytes(&self) -> Result<Vec<u8>, image::ImageError> {
        capture::encode_png(&self.photo)
    }

    /// Photo as a `data:image/png;base64,` URL, ready for an `<img src>`.
    pub fn photo_data_url(&self) -> Result<String, image::ImageError> {
        let png_bytes = self.photo_png_bytes()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png_bytes)
        ))
    }

    /// Serializable report; the photo is embedded when `include_photo` is set.
    pub fn report(&self, include_photo: bool) -> Result<ExtractionReport, image::ImageError> {
        let photo_data_url = if include_photo {
            Some(self.photo_data_url()?)
        } else {
            None
        };
        Ok(ExtractionReport {
            profile: self.profile.clone(),
            title: self.title.clone(),
            price: self.price.clone(),
            description: self.description.clone(),
            photo_data_url,
        })
    }

    /// Whether every text field came back as the sentinel.
    pub fn is_empty(&self) -> bool {
        self.title == NOT_FOUND && self.price == NOT_FOUND && self.description == NOT_FOUND
    }
}

/// Extract a listing from a decoded screenshot using `profile`.
///
/// Fails with the first error hit; the OCR session is released before the
/// error reaches the caller. Heuristics never fail on their own.
pub async fn extract<E: OcrEngine>(
    engine: &E,
    image: &DynamicImage,
    profile: &SiteProfile,
) -> Result<ExtractionResult, ExtractError> {
    let pipeline_start = std::time::Instant::now();
    capture::ensure_not_empty(image)?;
    log::info!(
        "[PIPELINE] Extracting '{}' from {}x{} screenshot",
        profile.name,
        image.width(),
        image.height()
    );

    let mut ocr = EngineGuard::begin(engine).await?;

    // Stage 1: title region
    let stage_start = std::time::Instant::now();
    let title = match profile.title.region() {
        Some(region) => {
            let crop = capture::crop(image, region)?;
            let output = ocr.recognize(&crop).await?;
            heuristics::extract_title(&output.text, profile)
        }
        None => NOT_FOUND.to_string(),
    };
    log::info!("[PIPELINE] Title: {:?} ({}ms)", title, stage_start.elapsed().as_millis());

    // Stage 2: price from the whole page
    let stage_start = std::time::Instant::now();
    let page = ocr.recognize(image).await?;
    let price = heuristics::extract_price(&page.text);
    log::info!("[PIPELINE] Price: {:?} ({}ms)", price, stage_start.elapsed().as_millis());

    // Stage 3: description region
    let stage_start = std::time::Instant::now();
    let description = match profile.description.region() {
        Some(region) => {
            let crop = capture::crop(image, region)?;
            let output = ocr.recognize(&crop).await?;
            heuristics::extract_description(&output.text, profile, &title)
        }
        None => NOT_FOUND.to_string(),
    };
    log::info!(
        "[PIPELINE] Description: {} chars ({}ms)",
        description.chars().count(),
        stage_start.elapsed().as_millis()
    );

    // Stage 4: photo, kept as a raster
    let photo = capture::crop(image, &profile.image)?;

    let calls = ocr.calls();
    ocr.finish();

    log::info!(
        "[PIPELINE] Total: {}ms ({} OCR calls)",
        pipeline_start.elapsed().as_millis(),
        calls
    );

    Ok(ExtractionResult {
        profile: profile.name.clone(),
        title,
        price,
        description,
        photo,
    })
}

/// Detect the profile for `url`, decode the screenshot, and extract.
///
/// Unsupported sites fail before any decoding or OCR work.
pub async fn extract_from_page<E: OcrEngine>(
    engine: &E,
    registry: &ProfileRegistry,
    url: &str,
    screenshot: Vec<u8>,
) -> Result<ExtractionResult, ExtractError> {
    let profile = registry.resolve(url)?;
    log::info!("[PROFILE] {} → {}", url, profile.name);

    let image = capture::decode_png_bytes(screenshot).await?;
    extract(engine, &image, profile).await
}
