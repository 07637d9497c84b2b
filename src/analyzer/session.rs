//! Scanner session: the single worker that owns a [`FrameAnalyzer`]

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use super::{AnalyzerCounters, FrameAnalyzer};
use crate::capture::{Frame, FrameSlot};

/// Snapshot of session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Frames offered by the camera
    pub frames_received: u64,
    /// Frames released without analysis (replaced, or arrived after close)
    pub frames_dropped: u64,
    /// Frames that went through the analyzer
    pub frames_analyzed: u64,
    /// Barcode detections emitted
    pub barcodes_emitted: u64,
    /// Title detections emitted
    pub titles_emitted: u64,
    /// Detector calls that failed
    pub detector_failures: u64,
    /// Detections dropped after teardown
    pub results_discarded: u64,
}

/// Feeds camera frames to one analyzer on a dedicated tokio task.
///
/// Frames are analyzed strictly one at a time, in arrival order. While a frame
/// is being analyzed, newer frames overwrite each other in the slot.
pub struct ScannerSession {
    analyzer_id: Uuid,
    slot: Arc<FrameSlot>,
    epoch: Arc<AtomicU64>,
    counters: Arc<AnalyzerCounters>,
    worker: Option<JoinHandle<()>>,
}

impl ScannerSession {
    /// Spawn the worker. Must be called inside a tokio runtime.
    pub fn start(mut analyzer: FrameAnalyzer) -> Self {
        let analyzer_id = analyzer.id();
        let slot = Arc::new(FrameSlot::new());
        let epoch = analyzer.epoch();
        let counters = analyzer.counters();

        let worker_slot = slot.clone();
        let worker = tokio::spawn(async move {
            info!(analyzer = %analyzer_id, "Scanner session started");
            while let Some(frame) = worker_slot.next().await {
                analyzer.analyze(frame).await;
            }
            info!(analyzer = %analyzer_id, "Scanner session stopped");
        });

        Self {
            analyzer_id,
            slot,
            epoch,
            counters,
            worker: Some(worker),
        }
    }

    /// Analyzer identifier
    pub fn analyzer_id(&self) -> Uuid {
        self.analyzer_id
    }

    /// Hand a frame to the analyzer. Never blocks.
    ///
    /// Returns `false` if the session is closed; the frame is released either way.
    pub fn submit(&self, frame: Frame) -> bool {
        self.slot.push(frame)
    }

    /// Current counters
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            frames_received: self.slot.received(),
            frames_dropped: self.slot.dropped(),
            frames_analyzed: self.counters.frames_analyzed.load(Ordering::Relaxed),
            barcodes_emitted: self.counters.barcodes_emitted.load(Ordering::Relaxed),
            titles_emitted: self.counters.titles_emitted.load(Ordering::Relaxed),
            detector_failures: self.counters.detector_failures.load(Ordering::Relaxed),
            results_discarded: self.counters.results_discarded.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting frames, analyze the one still waiting, then stop
    pub async fn finish(mut self) -> SessionStats {
        self.slot.close();
        self.join().await;
        self.stats()
    }

    /// Tear down: results of the frame in flight are discarded and a waiting
    /// frame is released unanalyzed
    pub async fn shutdown(mut self) -> SessionStats {
        self.tear_down();
        self.join().await;
        self.stats()
    }

    fn tear_down(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.slot.close();
        self.slot.discard_pending();
    }

    async fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!(analyzer = %self.analyzer_id, "Scanner worker ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ScannerSession {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.tear_down();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::replay::{FrameScript, ScriptedDetector};
    use crate::shared::StableDetection;
    use crate::vision::{BarcodeFormat, BoundingBox, DetectedBarcode, DetectedTextBlock};
    use crossbeam_channel::Receiver;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn start(scripts: Vec<FrameScript>) -> (ScannerSession, Receiver<StableDetection>) {
        let mut config = AppConfig::default();
        config.scanner.history_window_size = 1;
        config.scanner.vote_confidence_threshold = 1;

        let detector = Arc::new(ScriptedDetector::new(scripts));
        let (tx, rx) = crossbeam_channel::unbounded();
        let analyzer = FrameAnalyzer::new(&config, detector.clone(), detector, tx);
        (ScannerSession::start(analyzer), rx)
    }

    fn counted_frame(sequence: u64, releases: &Arc<AtomicUsize>) -> Frame {
        let counter = releases.clone();
        Frame::new(sequence, 1000, 1000, 0).on_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn slow_barcode(payload: &str, delay_ms: u64) -> FrameScript {
        FrameScript {
            barcode: Some(DetectedBarcode::new(payload, BarcodeFormat::Ean13)),
            detect_delay_ms: delay_ms,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_finish_analyzes_pending_frame() {
        let script = FrameScript {
            width: 1000,
            height: 1000,
            blocks: vec![DetectedTextBlock::new("Splendor", BoundingBox::new(200, 400, 600, 200))],
            ..Default::default()
        };
        let (session, rx) = start(vec![script]);
        let releases = Arc::new(AtomicUsize::new(0));

        assert!(session.submit(counted_frame(0, &releases)));
        let stats = session.finish().await;

        assert_eq!(stats.frames_analyzed, 1);
        assert_eq!(stats.titles_emitted, 1);
        assert_eq!(rx.try_recv().ok(), Some(StableDetection::title("Splendor")));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backlog_drops_older_frames() {
        let scripts = (0..10).map(|i| slow_barcode(&format!("400000000000{i}"), 20)).collect();
        let (session, rx) = start(scripts);
        let releases = Arc::new(AtomicUsize::new(0));

        for sequence in 0..10 {
            session.submit(counted_frame(sequence, &releases));
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        let stats = session.finish().await;

        assert_eq!(releases.load(Ordering::SeqCst), 10);
        assert_eq!(stats.frames_received, 10);
        assert!(stats.frames_dropped > 0);
        assert_eq!(stats.frames_analyzed + stats.frames_dropped, 10);

        // Emissions follow arrival order
        let payloads: Vec<String> = rx.try_iter().map(|d| d.value).collect();
        let mut sorted = payloads.clone();
        sorted.sort();
        assert_eq!(payloads, sorted);
    }

    #[tokio::test]
    async fn test_shutdown_discards_in_flight_result() {
        let (session, rx) = start(vec![slow_barcode("4006381333931", 50)]);
        let releases = Arc::new(AtomicUsize::new(0));

        session.submit(counted_frame(0, &releases));
        // Let the worker pick the frame up and enter the slow detector
        tokio::time::sleep(Duration::from_millis(10)).await;
        let stats = session.shutdown().await;

        assert_eq!(stats.results_discarded, 1);
        assert_eq!(stats.barcodes_emitted, 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_after_close_releases_frame() {
        let (session, _rx) = start(Vec::new());
        let releases = Arc::new(AtomicUsize::new(0));

        session.slot.close();
        assert!(!session.submit(counted_frame(0, &releases)));
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        let stats = session.finish().await;
        assert_eq!(stats.frames_dropped, 1);
        assert_eq!(stats.frames_analyzed, 0);
    }

    #[tokio::test]
    async fn test_drop_tears_down_session() {
        let (session, _rx) = start(Vec::new());
        let slot = session.slot.clone();
        let releases = Arc::new(AtomicUsize::new(0));

        drop(session);
        assert!(!slot.push(counted_frame(0, &releases)));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
