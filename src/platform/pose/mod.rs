// Pose detector integration
// Abstraction over the external model that finds body landmarks in an image

use crate::models::capture::RawFrame;
use crate::models::pose::{PoseResult, RawDetection};
use tracing::debug;

/// Pose detector trait
/// Implement this for the inference backend in use (MediaPipe, ONNX, ...)
pub trait PoseDetector: Send + Sync {
    /// Detect body landmarks in one decoded image.
    ///
    /// Finding nobody is not an error: return a detection with no landmarks.
    /// Blocking; called from a worker thread.
    fn detect(&self, image: &RawFrame) -> PoseResult<RawDetection>;

    /// Get model info
    fn model_info(&self) -> String;
}

// ==============================================================================
// Null Implementation (no inference)
// ==============================================================================

/// Detector that never finds anyone
#[derive(Debug, Default)]
pub struct NullPoseDetector;

impl NullPoseDetector {
    pub fn new() -> Self {
        debug!("Using null pose detector (no inference)");
        Self
    }
}

impl PoseDetector for NullPoseDetector {
    fn detect(&self, image: &RawFrame) -> PoseResult<RawDetection> {
        Ok(RawDetection::empty(image.width, image.height))
    }

    fn model_info(&self) -> String {
        "Null pose detector (no ML inference)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_detector_finds_nobody() {
        let detector = NullPoseDetector::new();
        let detection = detector.detect(&RawFrame::solid(32, 24, [0, 0, 0])).unwrap();

        assert_eq!((detection.width, detection.height), (32, 24));
        assert!(detection.landmarks.is_empty());
        assert!(!detector.model_info().is_empty());
    }
}
