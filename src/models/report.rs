// Analysis request, per-angle results and the final report

use crate::core::thumbnail::ThumbnailError;
use crate::models::capture::{CaptureError, VideoUpload};
use crate::models::features::{AlignmentVectorSet, JointAngleSet, SymmetryMetrics};
use crate::models::pose::{LandmarkSet, PoseError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ==============================================================================
// Request
// ==============================================================================

/// Camera viewpoint of one uploaded video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoAngle {
    Front,
    Left,
    Right,
    Back,
}

impl VideoAngle {
    pub const ALL: [VideoAngle; 4] = [
        VideoAngle::Front,
        VideoAngle::Left,
        VideoAngle::Right,
        VideoAngle::Back,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoAngle::Front => "front",
            VideoAngle::Left => "left",
            VideoAngle::Right => "right",
            VideoAngle::Back => "back",
        }
    }
}

impl fmt::Display for VideoAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoAngle {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "front" => Ok(VideoAngle::Front),
            "left" => Ok(VideoAngle::Left),
            "right" => Ok(VideoAngle::Right),
            "back" => Ok(VideoAngle::Back),
            other => Err(AnalysisError::UnknownAngle(other.to_string())),
        }
    }
}

/// Caller-supplied subject metadata, echoed unchanged in the report
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub age: Option<u32>,
    pub camera_distance_m: Option<f64>,
}

impl UserMetadata {
    pub fn validate(&self) -> AnalysisResult<()> {
        fn check(name: &str, value: Option<f64>, min: f64, max: f64) -> AnalysisResult<()> {
            match value {
                Some(v) if !(min..=max).contains(&v) => Err(AnalysisError::InvalidMetadata(format!(
                    "{}: {}. Must be between {} and {}",
                    name, v, min, max
                ))),
                _ => Ok(()),
            }
        }

        check("height_cm", self.height_cm, 50.0, 250.0)?;
        check("weight_kg", self.weight_kg, 20.0, 300.0)?;
        check("age", self.age.map(f64::from), 1.0, 120.0)?;
        check("camera_distance_m", self.camera_distance_m, 0.5, 10.0)?;
        Ok(())
    }
}

/// One analysis request: videos paired positionally with angle labels
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub angles: Vec<String>,
    pub videos: Vec<VideoUpload>,
    pub user_metadata: UserMetadata,
}

impl AnalysisRequest {
    /// Build a request from a comma-separated label list, e.g. "front,left"
    pub fn from_label_list(
        labels: &str,
        videos: Vec<VideoUpload>,
        user_metadata: UserMetadata,
    ) -> Self {
        Self {
            angles: labels.split(',').map(|l| l.trim().to_string()).collect(),
            videos,
            user_metadata,
        }
    }
}

// ==============================================================================
// Per-Angle Result
// ==============================================================================

/// Encoded still image chosen to represent a video
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub frame_index: usize,
    pub annotated: bool,
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl Thumbnail {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.jpeg)
    }
}

impl Serialize for Thumbnail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

/// Frame accounting and derived flags for one video
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleMetadata {
    pub video_angle: VideoAngle,
    pub total_frames: usize,
    pub frames_sampled: usize,
    pub frames_usable: usize,
    pub thumbnail_frame_index: usize,
    pub thumbnail_annotated: bool,
    /// At least three of the four torso landmarks were found
    pub pose_reliable: bool,
}

/// Aggregated features for one video angle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerAngleResult {
    pub video_angle: VideoAngle,
    pub landmarks: LandmarkSet,
    pub joint_angles: JointAngleSet,
    pub alignment_vectors: AlignmentVectorSet,
    pub symmetry: SymmetryMetrics,
    pub metadata: AngleMetadata,
    pub thumbnail: Thumbnail,
}

impl PerAngleResult {
    /// No sampled frame produced any feature
    pub fn is_empty(&self) -> bool {
        self.metadata.frames_usable == 0
    }
}

// ==============================================================================
// Report
// ==============================================================================

/// Final multi-angle report. Built once per request and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    analyses: BTreeMap<VideoAngle, PerAngleResult>,
    user_metadata: UserMetadata,
    total_processing_time_ms: f64,
    processing_times_ms: BTreeMap<VideoAngle, f64>,
    generated_at: DateTime<Utc>,
}

impl Report {
    pub(crate) fn new(
        results: Vec<(PerAngleResult, f64)>,
        user_metadata: UserMetadata,
    ) -> Self {
        let mut analyses = BTreeMap::new();
        let mut processing_times_ms = BTreeMap::new();
        for (result, elapsed_ms) in results {
            processing_times_ms.insert(result.video_angle, elapsed_ms);
            analyses.insert(result.video_angle, result);
        }

        // Angles run concurrently, so the slowest one bounds wall-clock time
        let total_processing_time_ms = processing_times_ms.values().copied().fold(0.0, f64::max);

        Self {
            analyses,
            user_metadata,
            total_processing_time_ms,
            processing_times_ms,
            generated_at: Utc::now(),
        }
    }

    pub fn get(&self, angle: VideoAngle) -> Option<&PerAngleResult> {
        self.analyses.get(&angle)
    }

    pub fn analyses(&self) -> impl Iterator<Item = (&VideoAngle, &PerAngleResult)> {
        self.analyses.iter()
    }

    pub fn angles(&self) -> impl Iterator<Item = VideoAngle> + '_ {
        self.analyses.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    pub fn user_metadata(&self) -> &UserMetadata {
        &self.user_metadata
    }

    pub fn total_processing_time_ms(&self) -> f64 {
        self.total_processing_time_ms
    }

    pub fn processing_time_ms(&self, angle: VideoAngle) -> Option<f64> {
        self.processing_times_ms.get(&angle).copied()
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

/// Coarse classification of request failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any processing
    Validation,
    /// A collaborator or encoder failed while processing
    Processing,
    /// Invalid numeric configuration
    Configuration,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("At least one video must be provided")]
    NoVideos,

    #[error("Maximum {max} videos allowed per request, got {count}")]
    TooManyVideos { count: usize, max: usize },

    #[error("Number of videos must match number of video angles: {videos} != {angles}")]
    AngleCountMismatch { videos: usize, angles: usize },

    #[error("Invalid video angle: {0}. Valid angles: front, left, right, back")]
    UnknownAngle(String),

    #[error("Each video must have a unique angle, {0} appears more than once")]
    DuplicateAngle(VideoAngle),

    #[error("Invalid video format: {0}")]
    UnsupportedFormat(String),

    #[error("File too large: {filename} is {size} bytes, maximum is {max}")]
    FileTooLarge { filename: String, size: u64, max: u64 },

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidFrameDimensions { width: u32, height: u32 },

    #[error("Frame source failed for {angle} video: {source}")]
    Capture {
        angle: VideoAngle,
        #[source]
        source: CaptureError,
    },

    #[error("Pose detection failed for {angle} video: {source}")]
    Detection {
        angle: VideoAngle,
        #[source]
        source: PoseError,
    },

    #[error("Thumbnail generation failed for {angle} video: {source}")]
    Thumbnail {
        angle: VideoAngle,
        #[source]
        source: ThumbnailError,
    },

    #[error("Processing task failed: {0}")]
    TaskFailed(String),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::NoVideos
            | AnalysisError::TooManyVideos { .. }
            | AnalysisError::AngleCountMismatch { .. }
            | AnalysisError::UnknownAngle(_)
            | AnalysisError::DuplicateAngle(_)
            | AnalysisError::UnsupportedFormat(_)
            | AnalysisError::FileTooLarge { .. }
            | AnalysisError::InvalidMetadata(_) => ErrorKind::Validation,
            AnalysisError::InvalidConfig(_) | AnalysisError::InvalidFrameDimensions { .. } => {
                ErrorKind::Configuration
            }
            AnalysisError::Capture { .. }
            | AnalysisError::Detection { .. }
            | AnalysisError::Thumbnail { .. }
            | AnalysisError::TaskFailed(_) => ErrorKind::Processing,
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
