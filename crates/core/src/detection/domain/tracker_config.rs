use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{DOWNSCALE_FACTOR, PUPIL_ROI_SIZE, REFLECTION_ROI_SIZE};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Calibration constants for pupil candidates.
///
/// The defaults are tuned to an infrared eye camera where the pupil is the
/// darkest blob; they are not physical limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PupilParams {
    /// Gray level above which a pixel is background (the pupil is below it).
    pub threshold: u8,
    pub close_iterations: u8,
    /// Exclusive contour area bounds.
    pub min_area: f64,
    pub max_area: f64,
    /// Candidates at or above this circularity are rejected.
    pub max_circularity: f64,
    pub roi_size: i32,
}

impl Default for PupilParams {
    fn default() -> Self {
        Self {
            threshold: 45,
            close_iterations: 4,
            min_area: 1000.0,
            max_area: 5000.0,
            max_circularity: 1.6,
            roi_size: PUPIL_ROI_SIZE,
        }
    }
}

/// Calibration constants for corneal reflection candidates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionParams {
    /// Gray level above which a pixel belongs to a highlight.
    pub threshold: u8,
    pub close_iterations: u8,
    /// Exclusive contour area bounds.
    pub min_area: f64,
    pub max_area: f64,
    /// Exclusive bounds on height/width of the minimum-area rectangle.
    pub min_aspect: f64,
    pub max_aspect: f64,
    pub roi_size: i32,
}

impl Default for ReflectionParams {
    fn default() -> Self {
        Self {
            threshold: 200,
            close_iterations: 2,
            min_area: 25.0,
            max_area: 500.0,
            min_aspect: 0.5,
            max_aspect: 2.0,
            roi_size: REFLECTION_ROI_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Integer factor by which ingested frames are shrunk on both axes.
    pub downscale: usize,
    pub pupil: PupilParams,
    pub reflection: ReflectionParams,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            downscale: DOWNSCALE_FACTOR,
            pupil: PupilParams::default(),
            reflection: ReflectionParams::default(),
        }
    }
}

impl TrackerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pupil;
        let r = &self.reflection;
        if self.downscale == 0 {
            return Err(ConfigError::Invalid("downscale factor must be at least 1".into()));
        }
        if p.min_area >= p.max_area {
            return Err(ConfigError::Invalid(format!(
                "pupil area bounds must be increasing, got ({}, {})",
                p.min_area, p.max_area
            )));
        }
        if r.min_area >= r.max_area {
            return Err(ConfigError::Invalid(format!(
                "reflection area bounds must be increasing, got ({}, {})",
                r.min_area, r.max_area
            )));
        }
        if p.max_circularity <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max circularity must be positive, got {}",
                p.max_circularity
            )));
        }
        if r.min_aspect <= 0.0 || r.min_aspect >= r.max_aspect {
            return Err(ConfigError::Invalid(format!(
                "reflection aspect bounds must be positive and increasing, got ({}, {})",
                r.min_aspect, r.max_aspect
            )));
        }
        if p.roi_size <= 0 || r.roi_size <= 0 {
            return Err(ConfigError::Invalid(format!(
                "ROI sizes must be positive, got pupil={} reflection={}",
                p.roi_size, r.roi_size
            )));
        }
        Ok(())
    }
}
