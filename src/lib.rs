pub mod core;
pub mod models;
pub mod platform;

pub use crate::core::config::{Config, ConfigError, ScaleReference, SymmetryWeights};
pub use crate::core::merger::PostureAnalyzer;
pub use crate::core::video_pipeline::VideoPipeline;
pub use crate::models::capture::{DetectedFrame, RawFrame, VideoFrame, VideoUpload};
pub use crate::models::pose::{BodyLandmark, Landmark, LandmarkSet, RawDetection, RawLandmark};
pub use crate::models::report::{
    AnalysisError, AnalysisRequest, AnalysisResult, ErrorKind, PerAngleResult, Report,
    UserMetadata, VideoAngle,
};
pub use crate::platform::{FrameSource, PoseDetector};
