//! Scanner configuration
//!
//! Defaults match a bench camera at roughly 10 sampled frames per second.
//! `ScanConfig::from_env` overlays `PUCK_*` environment variables so the CLI
//! and tests can tune thresholds without a config file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn parse_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_u8(name: &str, default: u8) -> u8 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .unwrap_or(default)
}

fn parse_env_f32(name: &str, default: f32) -> f32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// Thresholds used to find the puck and judge each slot window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Smallest accepted puck radius in pixels
    pub min_puck_radius: f32,
    /// Allowed deviation of the puck bounding box from square
    pub puck_aspect_tolerance: f32,
    /// Minimum bright fill of the inscribed disc
    pub min_puck_fill: f32,
    /// Slot window size relative to the expected symbol side
    pub window_scale: f32,
    /// Window contrast below this means no pin
    pub vacant_contrast: u8,
    /// Window contrast below this is too weak to sample
    pub min_contrast: u8,
    /// Allowed relative error of the dark bounding box against the expected side
    pub size_tolerance: f32,
    /// Fraction of finder/timing border modules that must match
    pub min_finder_score: f32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            min_puck_radius: 40.0,
            puck_aspect_tolerance: 0.2,
            min_puck_fill: 0.6,
            window_scale: 1.6,
            vacant_contrast: 40,
            min_contrast: 60,
            size_tolerance: 0.3,
            min_finder_score: 0.85,
        }
    }
}

/// Full scanner and pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Geometry template name or JSON path
    pub template: String,
    /// Maximum frames sampled per second
    pub max_sample_rate: f32,
    /// Decode queue depth
    pub queue_depth: usize,
    /// Unaligned time before the "no puck" message
    pub no_puck_timeout_ms: u64,
    /// Allowed centre shift and radius change, as a fraction of the radius
    pub continuity_tolerance: f32,
    /// Locator thresholds
    pub locator: LocatorConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            template: "unipuck".to_string(),
            max_sample_rate: 10.0,
            queue_depth: 1,
            no_puck_timeout_ms: 5_000,
            continuity_tolerance: 0.1,
            locator: LocatorConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Defaults with `PUCK_*` environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `PUCK_*` environment overrides on top of `self`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(template) = std::env::var("PUCK_TEMPLATE") {
            if !template.trim().is_empty() {
                self.template = template.trim().to_string();
            }
        }
        self.max_sample_rate = parse_env_f32("PUCK_MAX_SAMPLE_RATE", self.max_sample_rate);
        self.queue_depth = parse_env_usize("PUCK_QUEUE_DEPTH", self.queue_depth).max(1);
        self.no_puck_timeout_ms = parse_env_u64("PUCK_NO_PUCK_TIMEOUT_MS", self.no_puck_timeout_ms);
        self.continuity_tolerance =
            parse_env_f32("PUCK_CONTINUITY_TOLERANCE", self.continuity_tolerance);

        let locator = &mut self.locator;
        locator.min_puck_radius = parse_env_f32("PUCK_MIN_RADIUS", locator.min_puck_radius);
        locator.vacant_contrast = parse_env_u8("PUCK_VACANT_CONTRAST", locator.vacant_contrast);
        locator.min_contrast = parse_env_u8("PUCK_MIN_CONTRAST", locator.min_contrast);
        locator.min_finder_score = parse_env_f32("PUCK_MIN_FINDER_SCORE", locator.min_finder_score);
        self
    }

    /// Minimum time between two sampled frames
    pub fn sample_interval(&self) -> Duration {
        if self.max_sample_rate > 0.0 {
            Duration::from_secs_f64(1.0 / self.max_sample_rate as f64)
        } else {
            Duration::ZERO
        }
    }

    /// Unaligned time before the "no puck" message
    pub fn no_puck_timeout(&self) -> Duration {
        Duration::from_millis(self.no_puck_timeout_ms)
    }
}
