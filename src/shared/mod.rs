//! Types shared between the scanner and its consumers

pub mod messages;

pub use messages::{DetectionKind, StableDetection};
