//! Messages emitted by the scanner to its consumer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a detection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionKind {
    /// Game title read from the box art, confirmed by voting
    Title,
    /// Retail barcode payload
    Barcode,
}

/// Identification produced by the pipeline.
///
/// A steady camera produces the same detection repeatedly; the consumer decides
/// whether to debounce, display or navigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableDetection {
    /// Title text or barcode payload
    pub value: String,
    /// Detection source
    pub kind: DetectionKind,
}

impl StableDetection {
    /// Create a title detection
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: DetectionKind::Title,
        }
    }

    /// Create a barcode detection
    pub fn barcode(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: DetectionKind::Barcode,
        }
    }
}

impl fmt::Display for StableDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DetectionKind::Title => write!(f, "title: {}", self.value),
            DetectionKind::Barcode => write!(f, "barcode: {}", self.value),
        }
    }
}
