//! Shared test helpers: a scripted OCR engine and synthetic screenshots.

use image::{DynamicImage, RgbaImage};
use product_extractor_lib::error::EngineError;
use product_extractor_lib::ocr::{OcrEngine, OcrOutput, OcrSession};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the engine does on one recognition call.
#[derive(Debug, Clone)]
pub enum Step {
    Text(String),
    Fail,
    Hang,
}

pub fn text(s: &str) -> Step {
    Step::Text(s.to_string())
}

/// Lifecycle counters shared between an engine and its sessions.
#[derive(Debug, Default)]
pub struct Counters {
    pub begins: AtomicUsize,
    pub ends: AtomicUsize,
    pub recognitions: AtomicUsize,
    /// Raster sizes in call order.
    pub sizes: Mutex<Vec<(u32, u32)>>,
}

impl Counters {
    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn ends(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }

    pub fn recognitions(&self) -> usize {
        self.recognitions.load(Ordering::SeqCst)
    }

    pub fn sizes(&self) -> Vec<(u32, u32)> {
        self.sizes.lock().unwrap().clone()
    }
}

/// Engine that replays a fixed script of responses.
pub struct ScriptedEngine {
    script: Vec<Step>,
    fail_begin: bool,
    pub counters: Arc<Counters>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            fail_begin: false,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn failing_begin() -> Self {
        Self {
            fail_begin: true,
            ..Self::new(Vec::new())
        }
    }
}

pub struct ScriptedSession {
    script: VecDeque<Step>,
    counters: Arc<Counters>,
}

impl OcrEngine for ScriptedEngine {
    type Session = ScriptedSession;

    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn begin(&self) -> Result<ScriptedSession, EngineError> {
        self.counters.begins.fetch_add(1, Ordering::SeqCst);
        if self.fail_begin {
            return Err(EngineError::Unavailable("scripted begin failure".to_string()));
        }
        Ok(ScriptedSession {
            script: self.script.iter().cloned().collect(),
            counters: Arc::clone(&self.counters),
        })
    }
}

impl OcrSession for ScriptedSession {
    async fn recognize(&mut self, image: &DynamicImage) -> Result<OcrOutput, EngineError> {
        self.counters.recognitions.fetch_add(1, Ordering::SeqCst);
        self.counters
            .sizes
            .lock()
            .unwrap()
            .push((image.width(), image.height()));

        match self.script.pop_front() {
            Some(Step::Text(t)) => Ok(OcrOutput::new(t, 1.0)),
            Some(Step::Fail) => Err(EngineError::Crashed {
                status: "exit status: 1".to_string(),
                stderr: "scripted failure".to_string(),
            }),
            Some(Step::Hang) => std::future::pending().await,
            None => Ok(OcrOutput::new(String::new(), 1.0)),
        }
    }

    fn end(&mut self) {
        self.counters.ends.fetch_add(1, Ordering::SeqCst);
    }
}

/// Blank screenshot of the given size.
pub fn screenshot(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::new(width, height))
}
