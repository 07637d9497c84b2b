//! Application Configuration
//!
//! Scanner tuning parameters stored in TOML format. The numeric thresholds and
//! the keyword list were calibrated against real boxes; change them deliberately.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vision::{BarcodeFormat, DEFAULT_METADATA_KEYWORDS};

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Candidate scoring and voting settings
    pub scanner: ScannerConfig,
    /// Packaging boilerplate filter
    pub metadata: MetadataConfig,
    /// Barcode acceptance settings
    pub barcode: BarcodeConfig,
}

/// Candidate scoring and voting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Number of recent candidates kept for voting
    pub history_window_size: usize,
    /// Similar candidates needed before a title is emitted
    pub vote_confidence_threshold: usize,
    /// Minimum text block height relative to frame height
    pub min_block_height_ratio: f64,
    /// Best block score must exceed this to become a candidate
    pub candidate_score_floor: f64,
    /// Two readings count as the same title above this similarity
    pub similarity_match_floor: f64,
    /// Minimum cleaned text length
    pub min_text_length: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            history_window_size: 5,
            vote_confidence_threshold: 3,
            min_block_height_ratio: 0.05,
            candidate_score_floor: 0.8,
            similarity_match_floor: 0.8,
            min_text_length: 3,
        }
    }
}

/// Packaging boilerplate filter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Words that mark a line as player count / age / duration / credits
    pub keywords: Vec<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_METADATA_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Barcode acceptance settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeConfig {
    /// Symbologies that are reported; everything else is ignored
    pub accepted_formats: Vec<BarcodeFormat>,
}

impl Default for BarcodeConfig {
    fn default() -> Self {
        Self {
            accepted_formats: BarcodeFormat::retail(),
        }
    }
}

impl AppConfig {
    /// Check that the settings describe a usable scanner
    pub fn validate(&self) -> Result<()> {
        let scanner = &self.scanner;
        ensure!(scanner.history_window_size > 0, "history_window_size must be at least 1");
        ensure!(
            scanner.vote_confidence_threshold > 0,
            "vote_confidence_threshold must be at least 1"
        );
        ensure!(
            scanner.vote_confidence_threshold <= scanner.history_window_size,
            "vote_confidence_threshold ({}) cannot exceed history_window_size ({})",
            scanner.vote_confidence_threshold,
            scanner.history_window_size
        );
        for (name, value) in [
            ("min_block_height_ratio", scanner.min_block_height_ratio),
            ("similarity_match_floor", scanner.similarity_match_floor),
        ] {
            ensure!((0.0..=1.0).contains(&value), "{name} must be within 0.0..=1.0, got {value}");
        }
        ensure!(
            scanner.candidate_score_floor.is_finite(),
            "candidate_score_floor must be a finite number"
        );
        Ok(())
    }
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "boxspotter", "BoxSpotter")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Default configuration file path
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
