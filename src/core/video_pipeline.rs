// Single-video pipeline: normalize, aggregate and pick a thumbnail

use crate::core::config::Config;
use crate::core::frame_aggregator::FrameAggregator;
use crate::core::landmark_normalizer::LandmarkNormalizer;
use crate::core::thumbnail::ThumbnailSelector;
use crate::models::capture::{check_frame_sequence, DetectedFrame};
use crate::models::pose::Frame;
use crate::models::report::{
    AnalysisError, AnalysisResult, AngleMetadata, PerAngleResult, VideoAngle,
};
use std::thread;
use tracing::{debug, warn};

pub struct VideoPipeline {
    normalizer: LandmarkNormalizer,
    aggregator: FrameAggregator,
    thumbnails: ThumbnailSelector,
}

impl VideoPipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            normalizer: LandmarkNormalizer::new(config.min_detection_confidence),
            aggregator: FrameAggregator::new(config),
            thumbnails: ThumbnailSelector::new(config),
        }
    }

    /// Run the whole per-video analysis over an already detected frame sequence.
    ///
    /// The thumbnail is produced on its own thread while the sampled frames
    /// are aggregated. Zero usable frames still yields a result.
    pub fn process(
        &self,
        angle: VideoAngle,
        detected: &[DetectedFrame],
    ) -> AnalysisResult<PerAngleResult> {
        check_frame_sequence(detected)
            .map_err(|source| AnalysisError::Capture { angle, source })?;

        let frames = detected
            .iter()
            .map(|d| self.normalizer.normalize(d.frame.index, d.frame.timestamp, &d.detection))
            .collect::<AnalysisResult<Vec<Frame>>>()?;

        debug!("Normalized {} frames for {} video", frames.len(), angle);

        let (aggregated, thumbnail) = thread::scope(|scope| {
            let thumbnail = scope.spawn(|| self.thumbnails.create(detected, &frames));
            let aggregated = self.aggregator.aggregate(&frames);
            (aggregated, thumbnail.join())
        });

        let thumbnail = thumbnail
            .map_err(|_| {
                AnalysisError::TaskFailed(format!("Thumbnail worker for {} video panicked", angle))
            })?
            .map_err(|source| AnalysisError::Thumbnail { angle, source })?;

        if aggregated.frames_usable == 0 {
            warn!(
                "No usable frames in {} video ({} sampled), features are absent",
                angle, aggregated.frames_sampled
            );
        } else if !aggregated.pose_reliable {
            warn!("Torso not reliably detected in {} video", angle);
        }

        let metadata = AngleMetadata {
            video_angle: angle,
            total_frames: aggregated.total_frames,
            frames_sampled: aggregated.frames_sampled,
            frames_usable: aggregated.frames_usable,
            thumbnail_frame_index: thumbnail.frame_index,
            thumbnail_annotated: thumbnail.annotated,
            pose_reliable: aggregated.pose_reliable,
        };

        Ok(PerAngleResult {
            video_angle: angle,
            landmarks: aggregated.landmarks,
            joint_angles: aggregated.joint_angles,
            alignment_vectors: aggregated.alignment_vectors,
            symmetry: aggregated.symmetry,
            metadata,
            thumbnail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capture::{CaptureError, RawFrame, VideoFrame};
    use crate::models::features::Joint;
    use crate::models::pose::{BodyLandmark, CoordinateSpace, RawDetection, RawLandmark};

    fn detected(index: usize, landmarks: Vec<RawLandmark>) -> DetectedFrame {
        DetectedFrame {
            frame: VideoFrame {
                index,
                timestamp: index as f64 / 30.0,
                image: RawFrame::solid(40, 30, [20, 20, 20]),
            },
            detection: RawDetection {
                width: 40,
                height: 30,
                space: CoordinateSpace::Normalized,
                landmarks,
            },
        }
    }

    fn leg() -> Vec<RawLandmark> {
        [
            (BodyLandmark::LeftHip, 0.45, 0.5),
            (BodyLandmark::LeftKnee, 0.45, 0.7),
            (BodyLandmark::LeftAnkle, 0.45, 0.9),
        ]
        .into_iter()
        .map(|(landmark, x, y)| RawLandmark {
            landmark,
            x,
            y,
            z: None,
            visibility: 0.9,
        })
        .collect()
    }

    fn pipeline() -> VideoPipeline {
        VideoPipeline::new(&Config {
            frame_sample_stride: 2,
            ..Config::default()
        })
    }

    #[test]
    fn test_process_single_leg() {
        let frames: Vec<DetectedFrame> = (0..10).map(|i| detected(i, leg())).collect();
        let result = pipeline().process(VideoAngle::Left, &frames).unwrap();

        assert_eq!(result.video_angle, VideoAngle::Left);
        assert_eq!(result.metadata.total_frames, 10);
        assert_eq!(result.metadata.frames_sampled, 5);
        assert_eq!(result.metadata.frames_usable, 5);
        assert!(result.metadata.thumbnail_annotated);
        assert!(!result.metadata.pose_reliable);
        assert!((result.joint_angles.get(Joint::LeftKnee).unwrap() - 180.0).abs() < 1e-9);
        assert!(result.symmetry.is_empty());
    }

    #[test]
    fn test_empty_sequence_is_processing_error() {
        let err = pipeline().process(VideoAngle::Front, &[]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Capture {
                angle: VideoAngle::Front,
                source: CaptureError::NoFrames
            }
        ));
    }

    #[test]
    fn test_non_dense_indices_rejected() {
        let frames = vec![detected(0, leg()), detected(2, leg())];
        let err = pipeline().process(VideoAngle::Back, &frames).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Capture {
                source: CaptureError::NonDenseIndex { expected: 1, actual: 2 },
                ..
            }
        ));
    }

    #[test]
    fn test_zero_dimension_detection_rejected() {
        let mut frames: Vec<DetectedFrame> = (0..3).map(|i| detected(i, leg())).collect();
        frames[1].detection.width = 0;

        let err = pipeline().process(VideoAngle::Right, &frames).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidFrameDimensions { width: 0, .. }));
    }
}
