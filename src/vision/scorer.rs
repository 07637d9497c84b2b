//! Candidate selection from a frame's text blocks
//!
//! A box face held up to the camera shows the title as the largest, most
//! central text, so blocks are ranked by relative area and centrality.

use serde::Serialize;
use tracing::trace;

use super::normalize::clean_text;
use super::DetectedTextBlock;
use crate::config::ScannerConfig;

/// Best text block of a single frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Cleaned block text
    pub text: String,
    /// Salience score (area * 2 + centrality)
    pub score: f64,
}

/// Scores text blocks by size and centrality
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    /// Minimum cleaned text length in chars
    pub min_text_length: usize,
    /// Minimum block height as a fraction of frame height
    pub min_block_height_ratio: f64,
    /// Winning score must be strictly above this
    pub score_floor: f64,
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}

impl CandidateScorer {
    /// Build a scorer from scanner settings
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            min_text_length: config.min_text_length,
            min_block_height_ratio: config.min_block_height_ratio,
            score_floor: config.candidate_score_floor,
        }
    }

    /// Salience of a block, or `None` if it is too short or too small to trust
    pub fn block_score(
        &self,
        block: &DetectedTextBlock,
        cleaned: &str,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<f64> {
        if cleaned.chars().count() < self.min_text_length {
            return None;
        }

        let frame_w = frame_width as f64;
        let frame_h = frame_height as f64;

        if (block.bounds.height as f64) < self.min_block_height_ratio * frame_h {
            return None;
        }

        let area_score = block.bounds.area() / (frame_w * frame_h);

        let (center_x, center_y) = block.bounds.center();
        let centrality = 1.0
            - ((center_x - frame_w / 2.0).abs() / frame_w + (center_y - frame_h / 2.0).abs() / frame_h);

        Some(area_score * 2.0 + centrality)
    }

    /// Pick the highest scoring block, if it clears the floor.
    ///
    /// Ties keep the earliest block.
    pub fn score(
        &self,
        blocks: &[DetectedTextBlock],
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Candidate> {
        if frame_width == 0 || frame_height == 0 {
            return None;
        }

        let mut best: Option<Candidate> = None;

        for block in blocks {
            let cleaned = clean_text(&block.text);
            let Some(score) = self.block_score(block, &cleaned, frame_width, frame_height) else {
                trace!("Rejected text block {:?}", block.text);
                continue;
            };

            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Candidate { text: cleaned, score });
            }
        }

        best.filter(|candidate| candidate.score > self.score_floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::BoundingBox;

    const W: u32 = 1000;
    const H: u32 = 1000;

    fn block(text: &str, x: i32, y: i32, width: u32, height: u32) -> DetectedTextBlock {
        DetectedTextBlock::new(text, BoundingBox::new(x, y, width, height))
    }

    #[test]
    fn test_centered_title_wins() {
        let scorer = CandidateScorer::default();
        let blocks = vec![
            block("KOSMOS", 20, 20, 200, 60),
            block("CATAN", 200, 400, 600, 200),
            block("2-4 players", 700, 900, 250, 60),
        ];

        let candidate = scorer.score(&blocks, W, H).unwrap();
        assert_eq!(candidate.text, "CATAN");
        // area 0.12 * 2 + fully centered
        assert!((candidate.score - 1.24).abs() < 1e-9);
    }

    #[test]
    fn test_short_block_never_scored() {
        let scorer = CandidateScorer::default();
        // 49px on a 1000px frame is under 5%, even though it is big and centered
        let blocks = vec![block("Ticket to Ride", 0, 475, 1000, 49)];
        assert!(scorer.score(&blocks, W, H).is_none());

        let blocks = vec![block("Ticket to Ride", 0, 475, 1000, 50)];
        assert!(scorer.score(&blocks, W, H).is_some());
    }

    #[test]
    fn test_blank_and_tiny_text_rejected() {
        let scorer = CandidateScorer::default();
        let blocks = vec![
            block("", 200, 400, 600, 200),
            block("   \n ", 200, 400, 600, 200),
            block("A!", 200, 400, 600, 200),
        ];
        assert!(scorer.score(&blocks, W, H).is_none());
    }

    #[test]
    fn test_score_floor_rejects_corner_text() {
        let scorer = CandidateScorer::default();
        // Centered at (50, 50): centrality = 1 - (0.45 + 0.45) = 0.1
        let blocks = vec![block("Publisher", 0, 25, 100, 50)];
        assert!(scorer.score(&blocks, W, H).is_none());
    }

    #[test]
    fn test_score_exactly_at_floor_rejected() {
        let scorer = CandidateScorer {
            score_floor: 1.0,
            ..CandidateScorer::default()
        };
        // Perfectly centered with zero width: area 0, centrality 1.0
        let blocks = vec![block("Azul", 500, 450, 0, 100)];
        assert!(scorer.score(&blocks, W, H).is_none());
    }

    #[test]
    fn test_candidate_text_is_cleaned() {
        let scorer = CandidateScorer::default();
        let blocks = vec![block("  Wing-\nspan® ", 200, 400, 600, 200)];
        assert_eq!(scorer.score(&blocks, W, H).unwrap().text, "Wing span");
    }

    #[test]
    fn test_zero_sized_frame() {
        let scorer = CandidateScorer::default();
        let blocks = vec![block("Catan", 0, 0, 10, 10)];
        assert!(scorer.score(&blocks, 0, 0).is_none());
        assert!(scorer.score(&[], W, H).is_none());
    }

    #[test]
    fn test_tie_keeps_first_block() {
        let scorer = CandidateScorer::default();
        let blocks = vec![
            block("First", 200, 400, 600, 200),
            block("Second", 200, 400, 600, 200),
        ];
        assert_eq!(scorer.score(&blocks, W, H).unwrap().text, "First");
    }
}
