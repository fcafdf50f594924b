//! OCR domain: engine lifecycle for one extraction run.
//!
//! An `OcrEngine` hands out one `OcrSession` per run (`begin`). The session
//! recognizes rasters one at a time and is torn down by `end`. Sessions are
//! always driven through `EngineGuard`, which guarantees `end` runs exactly
//! once: explicitly via `finish`, or from `Drop` on error paths and when the
//! enclosing future is cancelled.
//!
//! Recognition is strictly sequential. The engines we wrap keep per-instance
//! state and are not safe to call concurrently, so `recognize` takes
//! `&mut self`. Do not parallelize calls against one session; a caller that
//! wants parallelism must `begin` separate sessions.

pub mod heuristics;
pub mod tesseract;

use crate::error::EngineError;
use image::DynamicImage;
use std::future::Future;

pub use tesseract::{TesseractConfig, TesseractEngine};

/// Text recognized from one raster.
#[derive(Debug, Clone, Default)]
pub struct OcrOutput {
    pub text: String,
    pub char_count: usize,
    pub latency_ms: f64,
}

impl OcrOutput {
    pub fn new(text: String, latency_ms: f64) -> Self {
        let char_count = text.chars().filter(|c| !c.is_whitespace()).count();
        Self {
            text,
            char_count,
            latency_ms,
        }
    }
}

/// A source of OCR sessions. Starting a session is expensive; one per run.
pub trait OcrEngine: Sync {
    type Session: OcrSession;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Acquire and initialize one engine instance.
    fn begin(&self) -> impl Future<Output = Result<Self::Session, EngineError>> + Send;
}

/// One live engine instance.
pub trait OcrSession: Send {
    /// Run OCR once on `image`. Not retried on failure.
    fn recognize(
        &mut self,
        image: &DynamicImage,
    ) -> impl Future<Output = Result<OcrOutput, EngineError>> + Send;

    /// Release engine resources. Synchronous so it can run from `Drop`.
    fn end(&mut self);
}

/// Scoped owner of a session: `end` runs once, on every exit path.
pub struct EngineGuard<S: OcrSession> {
    session: Option<S>,
    engine: &'static str,
    calls: usize,
}

impl<S: OcrSession> EngineGuard<S> {
    /// Start a session on `engine`.
    pub async fn begin<E>(engine: &E) -> Result<Self, EngineError>
    where
        E: OcrEngine<Session = S>,
    {
        let start = std::time::Instant::now();
        let session = engine.begin().await?;
        log::info!(
            "[OCR] {} session started in {}ms",
            engine.name(),
            start.elapsed().as_millis()
        );
        Ok(Self {
            session: Some(session),
            engine: engine.name(),
            calls: 0,
        })
    }

    /// Recognize one raster on the guarded session.
    pub async fn recognize(&mut self, image: &DynamicImage) -> Result<OcrOutput, EngineError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| EngineError::Unavailable("session already ended".to_string()))?;
        self.calls += 1;
        let start = std::time::Instant::now();
        let output = session.recognize(image).await?;
        log::info!(
            "[OCR] Call #{}: {}x{} → {} chars in {}ms",
            self.calls,
            image.width(),
            image.height(),
            output.char_count,
            start.elapsed().as_millis()
        );
        Ok(output)
    }

    /// Number of recognitions issued so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// End the session on the success path.
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.end();
            log::info!("[OCR] {} session ended after {} calls", self.engine, self.calls);
        }
    }
}

impl<S: OcrSession> Drop for EngineGuard<S> {
    fn drop(&mut self) {
        if self.session.is_some() {
            log::warn!("[OCR] {} session released on abort path", self.engine);
        }
        self.release();
    }
}
