//! Screenshot domain: public API.
//!
//! This module owns everything between the raw screenshot bytes handed over
//! by the host and the rasters the OCR engine sees: decoding, percentage →
//! pixel geometry, cropping and PNG encoding.

mod region;
mod screenshot;

pub use region::{crop, encode_png, pixel_bounds, PixelRect};
pub use screenshot::{decode_data_url, decode_png_bytes, ensure_not_empty, load_screenshot};
