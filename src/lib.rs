//! BoxSpotter - identify a board game box from a live camera feed
//!
//! Frames from the camera go through a barcode reader and a text recognizer.
//! Barcodes are reported as soon as they decode; title text is scored,
//! stripped of packaging boilerplate and voted on across recent frames before
//! it is reported.

pub mod analyzer;
pub mod capture;
pub mod config;
pub mod replay;
pub mod shared;
pub mod vision;

pub use analyzer::{FrameAnalyzer, ScannerSession, SessionStats};
pub use capture::{Frame, FrameSlot};
pub use config::AppConfig;
pub use shared::{DetectionKind, StableDetection};
