// Frame sampling and per-field median aggregation

use crate::core::alignment::AlignmentCalculator;
use crate::core::angle_calculator::AngleCalculator;
use crate::core::config::Config;
use crate::core::symmetry::SymmetryAnalyzer;
use crate::models::features::{
    AlignmentVector, AlignmentVectorSet, FrameFeatures, Joint, JointAngleSet, Segment,
    SymmetryMetrics,
};
use crate::models::pose::{BodyLandmark, Frame, Landmark, LandmarkSet};
use tracing::debug;

const TORSO_LANDMARKS: [BodyLandmark; 4] = [
    BodyLandmark::LeftShoulder,
    BodyLandmark::RightShoulder,
    BodyLandmark::LeftHip,
    BodyLandmark::RightHip,
];

// ==============================================================================
// Median Reducer
// ==============================================================================

/// Collects one field across frames, keeping absent samples apart from values
#[derive(Debug, Clone, Default)]
pub struct MedianReducer {
    values: Vec<f64>,
    absent: usize,
}

impl MedianReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Option<f64>) {
        match value {
            Some(v) if v.is_finite() => self.values.push(v),
            _ => self.absent += 1,
        }
    }

    pub fn present(&self) -> usize {
        self.values.len()
    }

    pub fn absent(&self) -> usize {
        self.absent
    }

    /// Median of the present values; the mean of the two middle values for even counts
    pub fn median(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }

        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);

        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }
}

// ==============================================================================
// Aggregated Output
// ==============================================================================

/// Median features of one video plus frame accounting
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedFeatures {
    pub landmarks: LandmarkSet,
    pub joint_angles: JointAngleSet,
    pub alignment_vectors: AlignmentVectorSet,
    pub symmetry: SymmetryMetrics,
    pub total_frames: usize,
    pub frames_sampled: usize,
    pub frames_usable: usize,
    pub pose_reliable: bool,
}

#[derive(Default)]
struct LandmarkReducer {
    x: MedianReducer,
    y: MedianReducer,
    z: MedianReducer,
    visibility: MedianReducer,
}

impl LandmarkReducer {
    fn push(&mut self, landmark: Option<&Landmark>) {
        if let Some(l) = landmark {
            self.x.push(Some(l.x));
            self.y.push(Some(l.y));
            self.z.push(l.z);
            self.visibility.push(Some(l.visibility));
        }
    }

    fn finish(&self) -> Option<Landmark> {
        Some(Landmark {
            x: self.x.median()?,
            y: self.y.median()?,
            z: self.z.median(),
            visibility: self.visibility.median()?,
        })
    }
}

/// Normalized and raw vectors are reduced apart so they never mix
#[derive(Default)]
struct VectorReducer {
    normalized: (MedianReducer, MedianReducer),
    raw: (MedianReducer, MedianReducer),
}

impl VectorReducer {
    fn push(&mut self, vector: Option<&AlignmentVector>) {
        if let Some(v) = vector {
            let (dx, dy) = if v.normalized {
                &mut self.normalized
            } else {
                &mut self.raw
            };
            dx.push(Some(v.dx));
            dy.push(Some(v.dy));
        }
    }

    fn finish(&self) -> Option<AlignmentVector> {
        if self.normalized.0.present() > 0 {
            Some(AlignmentVector::new(
                self.normalized.0.median()?,
                self.normalized.1.median()?,
                true,
            ))
        } else {
            Some(AlignmentVector::new(self.raw.0.median()?, self.raw.1.median()?, false))
        }
    }
}

#[derive(Default)]
struct SymmetryReducer {
    shoulder_height_diff: MedianReducer,
    hip_height_diff: MedianReducer,
    shoulder_width_ratio: MedianReducer,
    hip_width_ratio: MedianReducer,
    overall_symmetry_score: MedianReducer,
}

impl SymmetryReducer {
    fn push(&mut self, metrics: Option<&SymmetryMetrics>) {
        if let Some(m) = metrics {
            self.shoulder_height_diff.push(m.shoulder_height_diff);
            self.hip_height_diff.push(m.hip_height_diff);
            self.shoulder_width_ratio.push(m.shoulder_width_ratio);
            self.hip_width_ratio.push(m.hip_width_ratio);
            self.overall_symmetry_score.push(m.overall_symmetry_score);
        }
    }

    fn finish(&self) -> SymmetryMetrics {
        SymmetryMetrics {
            shoulder_height_diff: self.shoulder_height_diff.median(),
            hip_height_diff: self.hip_height_diff.median(),
            shoulder_width_ratio: self.shoulder_width_ratio.median(),
            hip_width_ratio: self.hip_width_ratio.median(),
            overall_symmetry_score: self.overall_symmetry_score.median(),
        }
    }
}

// ==============================================================================
// Frame Aggregator
// ==============================================================================

pub struct FrameAggregator {
    stride: usize,
    max_samples: Option<usize>,
    angles: AngleCalculator,
    alignment: AlignmentCalculator,
    symmetry: SymmetryAnalyzer,
}

impl FrameAggregator {
    pub fn new(config: &Config) -> Self {
        Self {
            stride: config.frame_sample_stride.max(1),
            max_samples: config.max_sampled_frames,
            angles: AngleCalculator::new(),
            alignment: AlignmentCalculator::new(config.scale_reference),
            symmetry: SymmetryAnalyzer::new(config.symmetry.clone()),
        }
    }

    /// Positions 0, stride, 2*stride, ... capped at `max_samples`
    pub fn sample_positions(&self, total_frames: usize) -> Vec<usize> {
        let positions = (0..total_frames).step_by(self.stride);
        match self.max_samples {
            Some(max) => positions.take(max).collect(),
            None => positions.collect(),
        }
    }

    /// Joint angles, alignment vectors and symmetry of a single frame
    pub fn extract(&self, landmarks: &LandmarkSet) -> FrameFeatures {
        let joint_angles = self.angles.calculate(landmarks);
        let alignment_vectors = self.alignment.calculate(landmarks);
        let symmetry = self.symmetry.analyze(landmarks, &joint_angles);

        FrameFeatures {
            joint_angles,
            alignment_vectors,
            symmetry,
        }
    }

    /// Sample the sequence and reduce every field to its median over the
    /// sampled frames where that field was present.
    pub fn aggregate(&self, frames: &[Frame]) -> AggregatedFeatures {
        let positions = self.sample_positions(frames.len());

        let mut landmark_reducers: Vec<LandmarkReducer> =
            BodyLandmark::ALL.iter().map(|_| LandmarkReducer::default()).collect();
        let mut angle_reducers: Vec<MedianReducer> =
            Joint::ALL.iter().map(|_| MedianReducer::new()).collect();
        let mut vector_reducers: Vec<VectorReducer> =
            Segment::ALL.iter().map(|_| VectorReducer::default()).collect();
        let mut symmetry_reducer = SymmetryReducer::default();
        let mut frames_usable = 0;

        for &position in &positions {
            let frame = &frames[position];
            let features = self.extract(&frame.landmarks);

            if !features.is_usable() {
                continue;
            }
            frames_usable += 1;

            for (id, reducer) in BodyLandmark::ALL.iter().zip(landmark_reducers.iter_mut()) {
                reducer.push(frame.landmarks.get(*id));
            }
            for (joint, angle) in features.joint_angles.iter() {
                angle_reducers[joint.index()].push(angle);
            }
            for (segment, vector) in features.alignment_vectors.iter() {
                vector_reducers[segment.index()].push(vector);
            }
            symmetry_reducer.push(features.symmetry.as_ref());
        }

        let landmarks: LandmarkSet = BodyLandmark::ALL
            .iter()
            .zip(landmark_reducers.iter())
            .filter_map(|(id, reducer)| reducer.finish().map(|l| (*id, l)))
            .collect();

        let mut joint_angles = JointAngleSet::new();
        for joint in Joint::ALL {
            joint_angles.set(joint, angle_reducers[joint.index()].median());
        }

        let mut alignment_vectors = AlignmentVectorSet::new();
        for segment in Segment::ALL {
            alignment_vectors.set(segment, vector_reducers[segment.index()].finish());
        }

        let torso_found = TORSO_LANDMARKS
            .iter()
            .filter(|id| landmarks.contains(**id))
            .count();

        debug!(
            "Aggregated {} of {} sampled frames ({} total), {} landmarks",
            frames_usable,
            positions.len(),
            frames.len(),
            landmarks.len()
        );

        AggregatedFeatures {
            landmarks,
            joint_angles,
            alignment_vectors,
            symmetry: symmetry_reducer.finish(),
            total_frames: frames.len(),
            frames_sampled: positions.len(),
            frames_usable,
            pose_reliable: torso_found >= 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pose::Landmark;

    fn frame(index: usize, points: &[(BodyLandmark, f64, f64)]) -> Frame {
        Frame {
            index,
            timestamp: index as f64 / 30.0,
            landmarks: points
                .iter()
                .map(|&(id, x, y)| (id, Landmark::new(x, y, 0.9)))
                .collect(),
        }
    }

    fn config(stride: usize) -> Config {
        Config {
            frame_sample_stride: stride,
            ..Config::default()
        }
    }

    #[test]
    fn test_median_reducer() {
        let mut reducer = MedianReducer::new();
        assert_eq!(reducer.median(), None);

        for v in [Some(3.0), None, Some(1.0), Some(100.0)] {
            reducer.push(v);
        }
        assert_eq!(reducer.present(), 3);
        assert_eq!(reducer.absent(), 1);
        assert_eq!(reducer.median(), Some(3.0));

        reducer.push(Some(2.0));
        assert_eq!(reducer.median(), Some(2.5));
    }

    #[test]
    fn test_absent_is_not_zero() {
        let mut reducer = MedianReducer::new();
        reducer.push(None);
        reducer.push(Some(0.0));
        reducer.push(None);
        assert_eq!(reducer.median(), Some(0.0));

        let mut empty = MedianReducer::new();
        empty.push(None);
        assert_eq!(empty.median(), None);
    }

    #[test]
    fn test_sample_positions() {
        let aggregator = FrameAggregator::new(&config(3));
        assert_eq!(aggregator.sample_positions(90).len(), 30);
        assert_eq!(aggregator.sample_positions(7), vec![0, 3, 6]);
        assert!(aggregator.sample_positions(0).is_empty());

        let capped = FrameAggregator::new(&Config {
            frame_sample_stride: 2,
            max_sampled_frames: Some(4),
            ..Config::default()
        });
        assert_eq!(capped.sample_positions(100), vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_median_suppresses_jitter() {
        let leg = |knee_x: f64| {
            [
                (BodyLandmark::LeftHip, 0.45, 0.5),
                (BodyLandmark::LeftKnee, knee_x, 0.7),
                (BodyLandmark::LeftAnkle, 0.45, 0.9),
            ]
        };
        let frames = vec![
            frame(0, &leg(0.45)),
            frame(1, &leg(0.45)),
            frame(2, &leg(0.60)), // outlier
        ];

        let aggregated = FrameAggregator::new(&config(1)).aggregate(&frames);
        let knee = aggregated.joint_angles.get(Joint::LeftKnee).unwrap();
        assert!((knee - 180.0).abs() < 1e-9);
        assert_eq!(aggregated.frames_usable, 3);
        assert!(aggregated.joint_angles.get(Joint::RightKnee).is_none());
    }

    #[test]
    fn test_normalized_vectors_preferred_over_raw() {
        let torso = [
            (BodyLandmark::LeftShoulder, 0.4, 0.3),
            (BodyLandmark::RightShoulder, 0.6, 0.3),
            (BodyLandmark::LeftHip, 0.45, 0.5),
            (BodyLandmark::RightHip, 0.55, 0.5),
            (BodyLandmark::LeftKnee, 0.45, 0.7),
        ];
        let thigh_only = [(BodyLandmark::LeftHip, 0.45, 0.5), (BodyLandmark::LeftKnee, 0.45, 0.9)];
        let frames = vec![frame(0, &torso), frame(1, &thigh_only), frame(2, &thigh_only)];

        let aggregated = FrameAggregator::new(&config(1)).aggregate(&frames);
        let thigh = aggregated.alignment_vectors.get(Segment::HipToKnee).unwrap();
        assert!(thigh.normalized);
        assert!((thigh.dy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_frames_without_features_are_not_usable() {
        let frames = vec![
            frame(0, &[]),
            frame(1, &[(BodyLandmark::Nose, 0.5, 0.1)]),
            frame(2, &[]),
        ];

        let aggregated = FrameAggregator::new(&config(1)).aggregate(&frames);
        assert_eq!(aggregated.total_frames, 3);
        assert_eq!(aggregated.frames_sampled, 3);
        assert_eq!(aggregated.frames_usable, 0);
        assert!(aggregated.landmarks.is_empty());
        assert!(aggregated.joint_angles.is_empty());
        assert!(aggregated.alignment_vectors.is_empty());
        assert!(aggregated.symmetry.is_empty());
        assert!(!aggregated.pose_reliable);
    }

    #[test]
    fn test_pose_reliability_needs_three_torso_landmarks() {
        let frames = vec![frame(
            0,
            &[
                (BodyLandmark::LeftShoulder, 0.4, 0.3),
                (BodyLandmark::RightShoulder, 0.6, 0.3),
                (BodyLandmark::LeftHip, 0.45, 0.5),
            ],
        )];
        let aggregated = FrameAggregator::new(&config(1)).aggregate(&frames);
        assert!(aggregated.pose_reliable);
        assert_eq!(aggregated.landmarks.len(), 3);
    }
}
