use crate::models::capture::VideoFormat;
use crate::models::report::AnalysisError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for AnalysisError {
    fn from(err: ConfigError) -> Self {
        AnalysisError::InvalidConfig(err.to_string())
    }
}

/// Body-scale length used to normalize alignment vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleReference {
    /// Distance between the shoulder centre and the hip centre
    TorsoLength,
    /// Distance between the two shoulders
    ShoulderWidth,
}

/// Weights and normalization scales for the overall symmetry score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymmetryWeights {
    pub shoulder_height: f64,
    pub hip_height: f64,
    pub shoulder_angle: f64,
    pub hip_angle: f64,
    pub knee_angle: f64,
    pub ankle_angle: f64,
    /// Height difference (normalized units) that counts as fully asymmetric
    pub height_diff_full_scale: f64,
    /// Angle difference (degrees) that counts as fully asymmetric
    pub angle_diff_full_scale: f64,
}

impl Default for SymmetryWeights {
    fn default() -> Self {
        Self {
            shoulder_height: 0.3,
            hip_height: 0.3,
            shoulder_angle: 0.1,
            hip_angle: 0.1,
            knee_angle: 0.1,
            ankle_angle: 0.1,
            height_diff_full_scale: 0.1,
            angle_diff_full_scale: 30.0,
        }
    }
}

impl SymmetryWeights {
    fn weights(&self) -> [(&'static str, f64); 6] {
        [
            ("shoulder_height", self.shoulder_height),
            ("hip_height", self.hip_height),
            ("shoulder_angle", self.shoulder_angle),
            ("hip_angle", self.hip_angle),
            ("knee_angle", self.knee_angle),
            ("ankle_angle", self.ankle_angle),
        ]
    }
}

/// Analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Landmarks below this visibility are treated as not detected (0.0-1.0)
    pub min_detection_confidence: f64,
    /// Analyze every Nth frame
    pub frame_sample_stride: usize,
    /// Upper bound on analyzed frames per video (None = unlimited)
    pub max_sampled_frames: Option<usize>,
    /// JPEG quality of thumbnails (1-100)
    pub thumbnail_quality: u8,
    /// Thumbnails larger than this are downscaled (aspect preserved)
    pub thumbnail_max_width: Option<u32>,
    pub thumbnail_max_height: Option<u32>,
    /// Largest accepted upload in bytes
    pub max_file_size_bytes: u64,
    /// Accepted video container formats
    pub allowed_formats: Vec<VideoFormat>,
    /// Maximum videos per request (at most one per angle)
    pub max_videos: usize,
    pub scale_reference: ScaleReference,
    pub symmetry: SymmetryWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            frame_sample_stride: 30, // Process every 30th frame
            max_sampled_frames: None,
            thumbnail_quality: 85,
            thumbnail_max_width: None,
            thumbnail_max_height: None,
            max_file_size_bytes: 100 * 1024 * 1024, // 100MB
            allowed_formats: vec![
                VideoFormat::Mp4,
                VideoFormat::Mov,
                VideoFormat::Avi,
                VideoFormat::Mkv,
            ],
            max_videos: 4,
            scale_reference: ScaleReference::TorsoLength,
            symmetry: SymmetryWeights::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating it with defaults if it doesn't exist
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.min_detection_confidence.is_finite()
            || !(0.0..=1.0).contains(&self.min_detection_confidence)
        {
            return Err(ConfigError::Invalid(format!(
                "Invalid detection confidence: {}. Must be between 0.0 and 1.0",
                self.min_detection_confidence
            )));
        }

        if self.frame_sample_stride == 0 {
            return Err(ConfigError::Invalid(
                "Invalid frame sample stride: 0. Must be at least 1".to_string(),
            ));
        }

        if self.max_sampled_frames == Some(0) {
            return Err(ConfigError::Invalid(
                "Invalid max sampled frames: 0. Must be at least 1 or unset".to_string(),
            ));
        }

        if !(1..=100).contains(&self.thumbnail_quality) {
            return Err(ConfigError::Invalid(format!(
                "Invalid thumbnail quality: {}. Must be between 1 and 100",
                self.thumbnail_quality
            )));
        }

        if self.thumbnail_max_width == Some(0) || self.thumbnail_max_height == Some(0) {
            return Err(ConfigError::Invalid(
                "Invalid thumbnail bounds: dimensions must be at least 1".to_string(),
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(ConfigError::Invalid(
                "Invalid max file size: 0. Must be positive".to_string(),
            ));
        }

        if self.allowed_formats.is_empty() {
            return Err(ConfigError::Invalid("Allowed formats cannot be empty".to_string()));
        }

        if !(1..=4).contains(&self.max_videos) {
            return Err(ConfigError::Invalid(format!(
                "Invalid max videos: {}. Must be between 1 and 4",
                self.max_videos
            )));
        }

        let mut total_weight = 0.0;
        for (name, weight) in self.symmetry.weights() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "Invalid symmetry weight for {}: {}. Must be non-negative",
                    name, weight
                )));
            }
            total_weight += weight;
        }
        if total_weight <= 0.0 {
            return Err(ConfigError::Invalid(
                "Symmetry weights cannot all be zero".to_string(),
            ));
        }

        for (name, scale) in [
            ("height_diff_full_scale", self.symmetry.height_diff_full_scale),
            ("angle_diff_full_scale", self.symmetry.angle_diff_full_scale),
        ] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "Invalid symmetry {}: {}. Must be positive",
                    name, scale
                )));
            }
        }

        Ok(())
    }
}
