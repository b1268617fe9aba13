// Landmark normalization - maps detector output into a normalized Frame

use crate::models::pose::{CoordinateSpace, Frame, Landmark, LandmarkSet, RawDetection};
use crate::models::report::{AnalysisError, AnalysisResult};

/// Validates and canonicalizes one frame's raw landmark set
#[derive(Debug, Clone, Copy)]
pub struct LandmarkNormalizer {
    min_confidence: f64,
}

impl LandmarkNormalizer {
    /// Create a normalizer
    ///
    /// # Arguments
    /// * `min_confidence` - Landmarks with lower visibility are dropped (0.0-1.0)
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Remap positions into [0,1]x[0,1] and drop low-confidence landmarks.
    ///
    /// Missing landmarks are not an error; only zero frame dimensions are.
    pub fn normalize(
        &self,
        index: usize,
        timestamp: f64,
        detection: &RawDetection,
    ) -> AnalysisResult<Frame> {
        if detection.width == 0 || detection.height == 0 {
            return Err(AnalysisError::InvalidFrameDimensions {
                width: detection.width,
                height: detection.height,
            });
        }

        let (scale_x, scale_y) = match detection.space {
            CoordinateSpace::Pixel => (detection.width as f64, detection.height as f64),
            CoordinateSpace::Normalized => (1.0, 1.0),
        };

        let mut landmarks = LandmarkSet::new();
        for raw in &detection.landmarks {
            if !raw.visibility.is_finite() || raw.visibility < self.min_confidence {
                continue;
            }
            if !raw.x.is_finite() || !raw.y.is_finite() {
                continue;
            }
            // First detection of a keypoint wins
            if landmarks.contains(raw.landmark) {
                continue;
            }

            landmarks.insert(
                raw.landmark,
                Landmark {
                    x: (raw.x / scale_x).clamp(0.0, 1.0),
                    y: (raw.y / scale_y).clamp(0.0, 1.0),
                    z: raw.z.filter(|z| z.is_finite()),
                    visibility: raw.visibility.min(1.0),
                },
            );
        }

        Ok(Frame {
            index,
            timestamp,
            landmarks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pose::{BodyLandmark, RawLandmark};

    fn raw(landmark: BodyLandmark, x: f64, y: f64, visibility: f64) -> RawLandmark {
        RawLandmark {
            landmark,
            x,
            y,
            z: None,
            visibility,
        }
    }

    #[test]
    fn test_pixel_positions_are_normalized() {
        let normalizer = LandmarkNormalizer::new(0.5);
        let detection = RawDetection {
            width: 640,
            height: 480,
            space: CoordinateSpace::Pixel,
            landmarks: vec![raw(BodyLandmark::Nose, 320.0, 120.0, 0.9)],
        };

        let frame = normalizer.normalize(7, 0.25, &detection).unwrap();
        let nose = frame.landmarks.get(BodyLandmark::Nose).unwrap();
        assert_eq!(frame.index, 7);
        assert_eq!(frame.timestamp, 0.25);
        assert!((nose.x - 0.5).abs() < 1e-12);
        assert!((nose.y - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_low_confidence_landmarks_are_absent() {
        let normalizer = LandmarkNormalizer::new(0.5);
        let detection = RawDetection {
            width: 100,
            height: 100,
            space: CoordinateSpace::Normalized,
            landmarks: vec![
                raw(BodyLandmark::LeftHip, 0.4, 0.5, 0.49),
                raw(BodyLandmark::RightHip, 0.6, 0.5, 0.5),
            ],
        };

        let frame = normalizer.normalize(0, 0.0, &detection).unwrap();
        assert!(frame.landmarks.get(BodyLandmark::LeftHip).is_none());
        assert!(frame.landmarks.get(BodyLandmark::RightHip).is_some());
    }

    #[test]
    fn test_out_of_frame_positions_are_clamped() {
        let normalizer = LandmarkNormalizer::new(0.5);
        let detection = RawDetection {
            width: 100,
            height: 200,
            space: CoordinateSpace::Pixel,
            landmarks: vec![raw(BodyLandmark::LeftAnkle, -5.0, 230.0, 0.8)],
        };

        let frame = normalizer.normalize(0, 0.0, &detection).unwrap();
        let ankle = frame.landmarks.get(BodyLandmark::LeftAnkle).unwrap();
        assert_eq!(ankle.x, 0.0);
        assert_eq!(ankle.y, 1.0);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let normalizer = LandmarkNormalizer::new(0.5);
        let detection = RawDetection::empty(0, 480);

        let result = normalizer.normalize(0, 0.0, &detection);
        assert!(matches!(
            result,
            Err(AnalysisError::InvalidFrameDimensions { width: 0, height: 480 })
        ));
    }

    #[test]
    fn test_empty_detection_is_not_an_error() {
        let normalizer = LandmarkNormalizer::new(0.5);
        let frame = normalizer.normalize(3, 0.1, &RawDetection::empty(64, 64)).unwrap();
        assert!(frame.landmarks.is_empty());
    }
}
