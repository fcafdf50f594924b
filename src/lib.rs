//! Product Extractor: listing fields from marketplace screenshots.
//!
//! Given a page URL and a full-page screenshot, finds the listing's title,
//! price, description and photo using per-site layout profiles and OCR.
//! No DOM access: everything comes from pixels.
//!
//! Domains:
//!   - profiles site profile registry + URL detection
//!   - capture  screenshot decode, percentage regions, cropping
//!   - ocr      engine lifecycle, tesseract backend, text heuristics
//!   - pipeline the end-to-end extraction run
//!   - config   environment / file configuration

pub mod capture;
pub mod config;
pub mod error;
pub mod ocr;
pub mod pipeline;
pub mod profiles;

pub use error::{EngineError, ExtractError};
pub use ocr::heuristics::NOT_FOUND;
pub use pipeline::{extract, extract_from_page, ExtractionReport, ExtractionResult};
pub use profiles::{detect_profile, ProfileRegistry, SiteProfile};
