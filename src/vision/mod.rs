//! Vision Layer
//!
//! Contracts for the barcode and text recognition engines, plus the pure
//! stabilization pieces that turn their noisy per-frame output into a single
//! identification:
//! - `scorer` - picks the dominant text block of a frame
//! - `normalize` - cleans text and rejects packaging boilerplate
//! - `voter` - corroborates candidates over a rolling window
//! - `similarity` - edit-distance similarity used by the voter

pub mod normalize;
pub mod scorer;
pub mod similarity;
pub mod voter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::frame::Frame;

pub use normalize::{clean_text, MetadataFilter, DEFAULT_METADATA_KEYWORDS};
pub use scorer::{Candidate, CandidateScorer};
pub use similarity::{levenshtein_distance, similarity};
pub use voter::StabilityVoter;

/// Axis-aligned rectangle in frame pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge (may be negative for partially visible text)
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Center point as (x, y)
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Area in square pixels
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }
}

/// Text region reported by the text recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedTextBlock {
    /// Raw recognized text, possibly multi-line
    pub text: String,
    /// Bounding box of the block
    pub bounds: BoundingBox,
}

impl DetectedTextBlock {
    /// Create a new text block
    pub fn new(text: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bounds,
        }
    }
}

/// Barcode symbology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    /// 13-digit retail product code
    Ean13,
    /// 8-digit retail product code
    Ean8,
    /// 12-digit North American product code
    UpcA,
    /// Compressed 8-digit UPC
    UpcE,
    Code128,
    Code39,
    QrCode,
    DataMatrix,
    /// Anything the engine reports that has no variant here
    Unknown,
}

impl BarcodeFormat {
    /// Default accepted set: the retail product codes printed on game boxes
    pub fn retail() -> Vec<BarcodeFormat> {
        vec![BarcodeFormat::Ean13, BarcodeFormat::Ean8, BarcodeFormat::UpcA]
    }
}

/// Barcode reported by the barcode reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedBarcode {
    /// Decoded payload
    pub payload: String,
    /// Symbology of the code
    pub format: BarcodeFormat,
}

impl DetectedBarcode {
    /// Create a new barcode result
    pub fn new(payload: impl Into<String>, format: BarcodeFormat) -> Self {
        Self {
            payload: payload.into(),
            format,
        }
    }
}

/// Failure of a detection engine on one frame.
///
/// Always transient from the pipeline's point of view: it is treated as "no
/// detection" for that frame.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetectorError {
    #[error("detector backend unavailable: {0}")]
    Unavailable(String),
    #[error("detection failed: {0}")]
    Failed(String),
    #[error("frame {width}x{height} cannot be processed")]
    InvalidFrame { width: u32, height: u32 },
}

/// Barcode reading engine
#[async_trait]
pub trait BarcodeDetector: Send + Sync {
    /// Decode at most one barcode from the frame
    async fn detect_barcode(&self, frame: &Frame) -> Result<Option<DetectedBarcode>, DetectorError>;
}

/// Text recognition engine
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Recognize all text blocks in the frame
    async fn detect_text(&self, frame: &Frame) -> Result<Vec<DetectedTextBlock>, DetectorError>;
}
