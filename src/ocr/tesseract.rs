//! Tesseract OCR via the `tesseract` command-line binary.
//!
//! `begin` resolves and probes the binary once, then creates a private
//! scratch directory for the run. Each `recognize` writes the raster there as
//! a PNG temp file and runs one tesseract process on it. `end` removes the
//! scratch directory.

use super::{OcrEngine, OcrOutput, OcrSession};
use crate::capture::encode_png;
use crate::error::EngineError;
use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::{TempDir, TempPath};

/// Default per-call timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default recognition language.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// How to find and invoke tesseract.
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// Explicit binary; resolved on PATH when `None`.
    pub binary: Option<PathBuf>,
    pub language: String,
    /// Page segmentation mode passed as `--psm`.
    pub page_seg_mode: Option<u8>,
    pub timeout: Duration,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: None,
            language: DEFAULT_LANGUAGE.to_string(),
            page_seg_mode: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Engine backed by the tesseract CLI.
#[derive(Debug, Clone, Default)]
pub struct TesseractEngine {
    config: TesseractConfig,
}

impl TesseractEngine {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TesseractConfig {
        &self.config
    }

    fn resolve_binary(&self) -> Result<PathBuf, EngineError> {
        match &self.config.binary {
            Some(path) if path.exists() => Ok(path.clone()),
            Some(path) => Err(EngineError::Unavailable(format!(
                "tesseract binary not found at {}",
                path.display()
            ))),
            None => which::which("tesseract").map_err(|e| {
                EngineError::Unavailable(format!("tesseract not found on PATH: {}", e))
            }),
        }
    }
}

impl OcrEngine for TesseractEngine {
    type Session = TesseractSession;

    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn begin(&self) -> Result<TesseractSession, EngineError> {
        let binary = self.resolve_binary()?;

        // Probe once so a broken install fails here, not on the first region.
        let mut probe_cmd = tokio::process::Command::new(&binary);
        probe_cmd
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let probe = tokio::time::timeout(self.config.timeout, probe_cmd.output())
            .await
            .map_err(|_| {
                EngineError::Unavailable(format!(
                    "tesseract --version timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                EngineError::Unavailable(format!("failed to run {}: {}", binary.display(), e))
            })?;
        if !probe.status.success() {
            return Err(EngineError::Unavailable(format!(
                "{} --version exited with {}",
                binary.display(),
                probe.status
            )));
        }
        // Older releases print the version on stderr.
        let banner = if probe.stdout.is_empty() { &probe.stderr } else { &probe.stdout };
        let version = String::from_utf8_lossy(banner)
            .lines()
            .next()
            .unwrap_or("unknown")
            .to_string();

        let scratch = tempfile::Builder::new()
            .prefix("product-extractor-")
            .tempdir()
            .map_err(|e| {
                EngineError::Unavailable(format!("failed to create scratch dir: {}", e))
            })?;

        log::info!(
            "[OCR] Using {} ({}), lang={}, scratch={}",
            binary.display(),
            version,
            self.config.language,
            scratch.path().display()
        );

        Ok(TesseractSession {
            binary,
            config: self.config.clone(),
            scratch: Some(scratch),
        })
    }
}

/// One tesseract run context. Owns the scratch directory until `end`.
#[derive(Debug)]
pub struct TesseractSession {
    binary: PathBuf,
    config: TesseractConfig,
    scratch: Option<TempDir>,
}

impl TesseractSession {
    /// Scratch directory of a live session; `None` once ended.
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    fn command(&self, input: &Path) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.arg(input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.language);
        if let Some(psm) = self.config.page_seg_mode {
            cmd.arg("--psm").arg(psm.to_string());
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Encode `image` as PNG into a fresh file under `dir`. The file is deleted
/// when the returned path is dropped.
fn write_region(image: &DynamicImage, dir: &Path) -> Result<TempPath, EngineError> {
    let png_bytes = encode_png(image).map_err(|e| EngineError::UnsupportedImage(e.to_string()))?;
    let mut file = tempfile::Builder::new()
        .prefix("region-")
        .suffix(".png")
        .tempfile_in(dir)?;
    file.write_all(&png_bytes)?;
    file.flush()?;
    Ok(file.into_temp_path())
}

impl OcrSession for TesseractSession {
    async fn recognize(&mut self, image: &DynamicImage) -> Result<OcrOutput, EngineError> {
        let dir = self
            .scratch_dir()
            .ok_or_else(|| EngineError::Unavailable("session already ended".to_string()))?
            .to_path_buf();
        let start = std::time::Instant::now();

        // PNG encode of a full page is CPU-bound; keep it off the runtime threads.
        let owned = image.clone();
        let input = tokio::task::spawn_blocking(move || write_region(&owned, &dir))
            .await
            .map_err(|e| EngineError::UnsupportedImage(format!("encoder task failed: {}", e)))??;

        let secs = self.config.timeout.as_secs();
        let mut cmd = self.command(&input);
        let result = tokio::time::timeout(self.config.timeout, cmd.output()).await;
        drop(input);

        let output = result.map_err(|_| EngineError::Timeout { secs })??;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(EngineError::Crashed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(OcrOutput::new(text, start.elapsed().as_micros() as f64 / 1000.0))
    }

    fn end(&mut self) {
        let Some(scratch) = self.scratch.take() else {
            return;
        };
        let path = scratch.path().to_path_buf();
        match scratch.close() {
            Ok(()) => log::debug!("[OCR] Removed scratch dir {}", path.display()),
            Err(e) => log::warn!("[OCR] Failed to remove scratch dir {}: {}", path.display(), e),
        }
    }
}
