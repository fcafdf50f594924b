//! Error types for an extraction run.
//!
//! A run surfaces exactly one `ExtractError`. OCR failures are kept in their
//! own enum so the engine backend can report them without knowing about the
//! pipeline, and so callers can tell "bad input" (`Decode`, `Capture`) apart
//! from "OCR broke" (`Engine`).

use crate::profiles::Region;
use thiserror::Error;

/// Failures of the external OCR engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    #[error("OCR recognition timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("OCR engine exited with {status}: {stderr}")]
    Crashed { status: String, stderr: String },

    #[error("Image could not be handed to the OCR engine: {0}")]
    UnsupportedImage(String),

    #[error("OCR engine I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything that can abort an extraction run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("This site is not supported: {url}")]
    UnsupportedSite { url: String },

    #[error("Failed to capture screenshot: {0}")]
    Capture(String),

    #[error("Region {region:?} is empty on a {width}x{height} image")]
    DegenerateRegion {
        region: Region,
        width: u32,
        height: u32,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to decode screenshot: {0}")]
    Decode(String),

    #[error("Invalid profile '{name}': {reason}")]
    InvalidProfile { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractError {
    /// True for failures caused by the input rather than the engine or profiles.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ExtractError::Capture(_) | ExtractError::Decode(_) | ExtractError::UnsupportedSite { .. }
        )
    }
}
