//! Frame Analyzer
//!
//! Runs the detectors on one frame at a time and turns their output into
//! [`StableDetection`]s:
//! barcode reader first, and only when it comes up empty the text recognizer,
//! whose blocks go through scoring, boilerplate filtering and voting.

pub mod session;

use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capture::Frame;
use crate::config::AppConfig;
use crate::shared::{DetectionKind, StableDetection};
use crate::vision::{
    BarcodeDetector, BarcodeFormat, CandidateScorer, DetectedBarcode, DetectedTextBlock,
    MetadataFilter, StabilityVoter, TextDetector,
};

pub use session::{ScannerSession, SessionStats};

/// Running totals shared between an analyzer and its session
#[derive(Debug, Default)]
pub struct AnalyzerCounters {
    /// Frames that went through `analyze`
    pub frames_analyzed: AtomicU64,
    /// Barcode detections emitted
    pub barcodes_emitted: AtomicU64,
    /// Title detections emitted
    pub titles_emitted: AtomicU64,
    /// Detector calls that returned an error
    pub detector_failures: AtomicU64,
    /// Detections dropped because the analyzer was torn down mid-frame
    pub results_discarded: AtomicU64,
}

/// Per-frame detection orchestrator.
///
/// `analyze` takes `&mut self`, so the voting history can only be touched by
/// whoever owns the analyzer; [`ScannerSession`] keeps it on a single worker.
pub struct FrameAnalyzer {
    id: Uuid,
    barcode_detector: Arc<dyn BarcodeDetector>,
    text_detector: Arc<dyn TextDetector>,
    accepted_formats: Vec<BarcodeFormat>,
    scorer: CandidateScorer,
    metadata_filter: MetadataFilter,
    voter: StabilityVoter,
    output: Sender<StableDetection>,
    epoch: Arc<AtomicU64>,
    generation: u64,
    counters: Arc<AnalyzerCounters>,
}

impl FrameAnalyzer {
    /// Create an analyzer that sends detections to `output`
    pub fn new(
        config: &AppConfig,
        barcode_detector: Arc<dyn BarcodeDetector>,
        text_detector: Arc<dyn TextDetector>,
        output: Sender<StableDetection>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            barcode_detector,
            text_detector,
            accepted_formats: config.barcode.accepted_formats.clone(),
            scorer: CandidateScorer::from_config(&config.scanner),
            metadata_filter: MetadataFilter::new(&config.metadata.keywords),
            voter: StabilityVoter::from_config(&config.scanner),
            output,
            epoch: Arc::new(AtomicU64::new(0)),
            generation: 0,
            counters: Arc::new(AnalyzerCounters::default()),
        }
    }

    /// Identifier used in log output
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Shared counters
    pub fn counters(&self) -> Arc<AnalyzerCounters> {
        self.counters.clone()
    }

    /// Teardown switch: bumping the value invalidates in-flight analysis
    pub(crate) fn epoch(&self) -> Arc<AtomicU64> {
        self.epoch.clone()
    }

    fn is_torn_down(&self) -> bool {
        self.epoch.load(Ordering::SeqCst) != self.generation
    }

    /// Analyze one frame, emitting at most one detection.
    ///
    /// The frame is released when this returns, whichever path was taken.
    pub async fn analyze(&mut self, frame: Frame) {
        let detection = self.evaluate(&frame).await;
        self.counters.frames_analyzed.fetch_add(1, Ordering::Relaxed);

        let Some(detection) = detection else {
            return;
        };

        if self.is_torn_down() {
            self.counters.results_discarded.fetch_add(1, Ordering::Relaxed);
            debug!(analyzer = %self.id, "Discarding result for frame {} after teardown", frame.sequence);
            return;
        }

        let counter = match detection.kind {
            DetectionKind::Barcode => &self.counters.barcodes_emitted,
            DetectionKind::Title => &self.counters.titles_emitted,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        info!(analyzer = %self.id, "Frame {}: {}", frame.sequence, detection);
        if self.output.send(detection).is_err() {
            debug!(analyzer = %self.id, "Detection receiver is gone");
        }
    }

    async fn evaluate(&mut self, frame: &Frame) -> Option<StableDetection> {
        if self.is_torn_down() {
            return None;
        }

        if let Some(barcode) = self.read_barcode(frame).await {
            return Some(StableDetection::barcode(barcode.payload));
        }

        if self.is_torn_down() {
            return None;
        }

        let blocks = match self.text_detector.detect_text(frame).await {
            Ok(blocks) => blocks,
            Err(e) => {
                self.counters.detector_failures.fetch_add(1, Ordering::Relaxed);
                warn!(analyzer = %self.id, "Text detection failed on frame {}: {}", frame.sequence, e);
                return None;
            }
        };

        if self.is_torn_down() {
            return None;
        }

        let (width, height) = frame.upright_dimensions();
        self.stabilize_title(&blocks, width, height)
            .map(StableDetection::title)
    }

    /// Accepted, non-empty barcode on the frame, if any. Failures read as none.
    async fn read_barcode(&self, frame: &Frame) -> Option<DetectedBarcode> {
        match self.barcode_detector.detect_barcode(frame).await {
            Ok(Some(barcode)) if self.accepts(&barcode) => Some(barcode),
            Ok(Some(barcode)) => {
                debug!("Ignoring {:?} barcode on frame {}", barcode.format, frame.sequence);
                None
            }
            Ok(None) => None,
            Err(e) => {
                self.counters.detector_failures.fetch_add(1, Ordering::Relaxed);
                warn!(analyzer = %self.id, "Barcode detection failed on frame {}: {}", frame.sequence, e);
                None
            }
        }
    }

    fn accepts(&self, barcode: &DetectedBarcode) -> bool {
        !barcode.payload.trim().is_empty() && self.accepted_formats.contains(&barcode.format)
    }

    /// Score, filter and vote. Metadata lines never reach the voter.
    fn stabilize_title(
        &mut self,
        blocks: &[DetectedTextBlock],
        frame_width: u32,
        frame_height: u32,
    ) -> Option<String> {
        let candidate = self.scorer.score(blocks, frame_width, frame_height)?;

        if self.metadata_filter.is_likely_metadata(&candidate.text) {
            debug!("Skipping packaging text {:?}", candidate.text);
            return None;
        }

        debug!("Candidate {:?} (score {:.3})", candidate.text, candidate.score);
        self.voter.observe(&candidate.text)
    }
}
