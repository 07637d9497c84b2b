//! Temporal voting over recent title candidates
//!
//! A single OCR reading is unreliable; a reading that keeps coming back across
//! several frames (allowing for a wrong letter here and there) is not.

use std::collections::VecDeque;

use tracing::debug;

use super::similarity::similarity;
use crate::config::ScannerConfig;

/// Rolling-window voter that emits a value once enough similar readings agree.
///
/// History is kept after an emission, so a steady reading emits again on every
/// frame it keeps winning. Consumers debounce.
#[derive(Debug, Clone)]
pub struct StabilityVoter {
    history: VecDeque<String>,
    window_size: usize,
    confidence_threshold: usize,
    match_floor: f64,
}

impl Default for StabilityVoter {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}

impl StabilityVoter {
    /// Create a voter with explicit parameters
    pub fn new(window_size: usize, confidence_threshold: usize, match_floor: f64) -> Self {
        let window_size = window_size.max(1);
        Self {
            history: VecDeque::with_capacity(window_size + 1),
            window_size,
            confidence_threshold,
            match_floor,
        }
    }

    /// Create a voter from scanner settings
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            config.history_window_size,
            config.vote_confidence_threshold,
            config.similarity_match_floor,
        )
    }

    /// Record a normalized candidate and return the stabilized value, if any.
    ///
    /// Entries similar to `text` (strictly above the match floor) form the
    /// cluster. Once the cluster is large enough, its most frequent exact string
    /// wins; ties go to the earliest entry still in the window.
    pub fn observe(&mut self, text: &str) -> Option<String> {
        self.history.push_back(text.to_string());
        while self.history.len() > self.window_size {
            self.history.pop_front();
        }

        let cluster: Vec<&str> = self
            .history
            .iter()
            .map(String::as_str)
            .filter(|entry| similarity(entry, text) > self.match_floor)
            .collect();

        if cluster.len() < self.confidence_threshold {
            debug!(
                "Vote for {:?}: {}/{} similar readings",
                text,
                cluster.len(),
                self.confidence_threshold
            );
            return None;
        }

        // (value, count) in first-seen order
        let mut tally: Vec<(&str, usize)> = Vec::new();
        for entry in cluster {
            match tally.iter_mut().find(|(value, _)| *value == entry) {
                Some((_, count)) => *count += 1,
                None => tally.push((entry, 1)),
            }
        }

        let mut winner: Option<(&str, usize)> = None;
        for (value, count) in tally {
            if winner.map_or(true, |(_, best)| count > best) {
                winner = Some((value, count));
            }
        }

        winner.map(|(value, _)| value.to_string())
    }

    /// Number of readings currently in the window
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Configured window capacity
    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(voter: &mut StabilityVoter, readings: &[&str]) -> Vec<Option<String>> {
        readings.iter().map(|r| voter.observe(r)).collect()
    }

    #[test]
    fn test_noisy_sequence_stabilizes() {
        let mut voter = StabilityVoter::default();
        let results = feed(&mut voter, &["Catan", "Catnn", "Catan", "Gatan", "Catan"]);

        assert!(results[..4].iter().all(Option::is_none));
        assert_eq!(results[4].as_deref(), Some("Catan"));
    }

    #[test]
    fn test_keeps_emitting_while_steady() {
        let mut voter = StabilityVoter::default();
        feed(&mut voter, &["Catan", "Catnn", "Catan", "Gatan", "Catan"]);

        assert_eq!(voter.observe("Catan").as_deref(), Some("Catan"));
        assert_eq!(voter.observe("Catan").as_deref(), Some("Catan"));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut voter = StabilityVoter::new(5, 3, 0.8);
        for i in 0..20 {
            voter.observe(&format!("reading {i}"));
            assert!(voter.history_len() <= 5);
        }
        assert_eq!(voter.history_len(), 5);
    }

    #[test]
    fn test_old_readings_age_out() {
        let mut voter = StabilityVoter::new(3, 2, 0.8);
        assert_eq!(voter.observe("Azul"), None);
        assert_eq!(voter.observe("Wingspan"), None);
        assert_eq!(voter.observe("Dixit"), None);
        // "Azul" was evicted before the second one arrived
        assert_eq!(voter.observe("Azul"), None);
        assert_eq!(voter.observe("Azul").as_deref(), Some("Azul"));
    }

    #[test]
    fn test_most_frequent_variant_wins() {
        let mut voter = StabilityVoter::new(5, 3, 0.8);
        feed(&mut voter, &["Carcassonne", "Carcassone", "Carcassonne"]);
        // Observed variant differs, but the cluster majority is the correct spelling
        assert_eq!(voter.observe("Carcasonne").as_deref(), Some("Carcassonne"));
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let mut voter = StabilityVoter::new(4, 4, 0.8);
        let results = feed(&mut voter, &["Pandemic", "Pandemlc", "Pandemic", "Pandemlc"]);
        assert_eq!(results[3].as_deref(), Some("Pandemic"));
    }

    #[test]
    fn test_unrelated_readings_never_stabilize() {
        let mut voter = StabilityVoter::default();
        let results = feed(&mut voter, &["Catan", "Azul", "Dixit", "Wingspan", "Splendor", "Root"]);
        assert!(results.iter().all(Option::is_none));
    }

    #[test]
    fn test_window_of_one_emits_everything() {
        let mut voter = StabilityVoter::new(1, 1, 0.8);
        assert_eq!(voter.observe("Catan").as_deref(), Some("Catan"));
        assert_eq!(voter.observe("Azul").as_deref(), Some("Azul"));
        assert_eq!(voter.history_len(), 1);
    }

    #[test]
    fn test_deterministic_for_fixed_input() {
        let readings = ["Root", "RooT", "Root", "R00t", "Rooot", "Root", "Rot"];
        let a = feed(&mut StabilityVoter::default(), &readings);
        let b = feed(&mut StabilityVoter::default(), &readings);
        assert_eq!(a, b);
    }
}
