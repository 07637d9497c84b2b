//! Scripted scan sessions
//!
//! A scenario file describes what the barcode reader and text recognizer
//! "see" on each frame. Replaying it drives the real analyzer and session with
//! stand-in detectors, which is how scanner tuning is checked without a camera.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::analyzer::{FrameAnalyzer, ScannerSession, SessionStats};
use crate::capture::Frame;
use crate::config::AppConfig;
use crate::shared::StableDetection;
use crate::vision::{
    BarcodeDetector, DetectedBarcode, DetectedTextBlock, DetectorError, TextDetector,
};

fn default_frame_interval_ms() -> u64 {
    33
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_repeat() -> u32 {
    1
}

/// A recorded scan session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Delay between frames offered by the simulated camera
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Frame scripts in capture order
    #[serde(default)]
    pub frames: Vec<FrameScript>,
}

/// What the detectors report for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameScript {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub rotation: u16,
    /// Barcode decoded on this frame
    #[serde(default)]
    pub barcode: Option<DetectedBarcode>,
    /// Make the barcode reader fail with this message
    #[serde(default)]
    pub barcode_error: Option<String>,
    /// Text blocks recognized on this frame
    #[serde(default)]
    pub blocks: Vec<DetectedTextBlock>,
    /// Make the text recognizer fail with this message
    #[serde(default)]
    pub text_error: Option<String>,
    /// Simulated latency of each detector call
    #[serde(default)]
    pub detect_delay_ms: u64,
    /// Number of consecutive frames sharing this script
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl Default for FrameScript {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            rotation: 0,
            barcode: None,
            barcode_error: None,
            blocks: Vec::new(),
            text_error: None,
            detect_delay_ms: 0,
            repeat: default_repeat(),
        }
    }
}

impl FrameScript {
    /// Build the frame this script describes
    pub fn frame(&self, sequence: u64) -> Frame {
        Frame::new(sequence, self.width, self.height, self.rotation)
    }
}

impl Scenario {
    /// Parse a scenario from TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse scenario")
    }

    /// Load a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Invalid scenario {:?}", path))
    }

    /// One script per frame, with `repeat` unrolled
    pub fn expanded_frames(&self) -> Vec<FrameScript> {
        self.frames
            .iter()
            .flat_map(|script| std::iter::repeat(script.clone()).take(script.repeat as usize))
            .map(|script| FrameScript { repeat: 1, ..script })
            .collect()
    }
}

/// Detector pair answering from per-frame scripts, keyed by frame sequence
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    scripts: Vec<FrameScript>,
    barcode_calls: AtomicUsize,
    text_calls: AtomicUsize,
}

impl ScriptedDetector {
    /// Create a detector where frame `n` is answered by `scripts[n]`
    pub fn new(scripts: Vec<FrameScript>) -> Self {
        Self {
            scripts,
            barcode_calls: AtomicUsize::new(0),
            text_calls: AtomicUsize::new(0),
        }
    }

    /// Barcode reader invocations so far
    pub fn barcode_calls(&self) -> usize {
        self.barcode_calls.load(Ordering::SeqCst)
    }

    /// Text recognizer invocations so far
    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    async fn script_for(&self, frame: &Frame) -> Option<&FrameScript> {
        let script = usize::try_from(frame.sequence)
            .ok()
            .and_then(|index| self.scripts.get(index))?;
        if script.detect_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(script.detect_delay_ms)).await;
        }
        Some(script)
    }
}

#[async_trait]
impl BarcodeDetector for ScriptedDetector {
    async fn detect_barcode(&self, frame: &Frame) -> Result<Option<DetectedBarcode>, DetectorError> {
        self.barcode_calls.fetch_add(1, Ordering::SeqCst);
        let Some(script) = self.script_for(frame).await else {
            return Ok(None);
        };
        match &script.barcode_error {
            Some(message) => Err(DetectorError::Failed(message.clone())),
            None => Ok(script.barcode.clone()),
        }
    }
}

#[async_trait]
impl TextDetector for ScriptedDetector {
    async fn detect_text(&self, frame: &Frame) -> Result<Vec<DetectedTextBlock>, DetectorError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        let Some(script) = self.script_for(frame).await else {
            return Ok(Vec::new());
        };
        match &script.text_error {
            Some(message) => Err(DetectorError::Unavailable(message.clone())),
            None => Ok(script.blocks.clone()),
        }
    }
}

/// Outcome of a replayed session
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Detections in emission order
    pub detections: Vec<StableDetection>,
    /// Session counters
    pub stats: SessionStats,
    /// Frames whose release callback ran
    pub frames_released: usize,
}

/// Replay a scenario through a scanner session.
///
/// Must run inside a tokio runtime.
pub async fn run_scenario(scenario: &Scenario, config: &AppConfig) -> Result<ReplayReport> {
    config.validate()?;

    let scripts = scenario.expanded_frames();
    let frames: Vec<Frame> = scripts
        .iter()
        .enumerate()
        .map(|(sequence, script)| script.frame(sequence as u64))
        .collect();
    let detector = Arc::new(ScriptedDetector::new(scripts));

    let (tx, rx) = crossbeam_channel::unbounded();
    let analyzer = FrameAnalyzer::new(config, detector.clone(), detector.clone(), tx);
    let session = ScannerSession::start(analyzer);
    info!("Replaying {} frames", frames.len());

    let released = Arc::new(AtomicUsize::new(0));
    let interval = Duration::from_millis(scenario.frame_interval_ms);

    for frame in frames {
        let counter = released.clone();
        session.submit(frame.on_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }

    let stats = session.finish().await;

    Ok(ReplayReport {
        detections: rx.try_iter().collect(),
        stats,
        frames_released: released.load(Ordering::SeqCst),
    })
}
