// Left/right symmetry analysis

use crate::core::config::SymmetryWeights;
use crate::core::geometry::{BodyPoint, Point2, EPSILON};
use crate::models::features::{Joint, JointAngleSet, SymmetryMetrics};
use crate::models::pose::{BodyLandmark as L, LandmarkSet};

pub struct SymmetryAnalyzer {
    weights: SymmetryWeights,
}

impl SymmetryAnalyzer {
    pub fn new(weights: SymmetryWeights) -> Self {
        Self { weights }
    }

    /// Compare the left and right side of one frame.
    ///
    /// Each pair contributes `weight * normalized_diff` where the normalized
    /// difference is capped at 1. Missing pairs are left out and the remaining
    /// weights renormalized. Returns None when no pair could be compared.
    pub fn analyze(
        &self,
        landmarks: &LandmarkSet,
        angles: &JointAngleSet,
    ) -> Option<SymmetryMetrics> {
        let point = |id| BodyPoint::Landmark(id).resolve(landmarks);
        let shoulders = pair(point(L::LeftShoulder), point(L::RightShoulder));
        let hips = pair(point(L::LeftHip), point(L::RightHip));

        let shoulder_height_diff = shoulders.map(|(l, r)| (l.y - r.y).abs());
        let hip_height_diff = hips.map(|(l, r)| (l.y - r.y).abs());

        let shoulder_width = shoulders.map(|(l, r)| l.distance(r));
        let hip_width = hips.map(|(l, r)| l.distance(r));

        let w = &self.weights;
        let height_scale = w.height_diff_full_scale;
        let angle_scale = w.angle_diff_full_scale;
        let angle_diff = |left: Joint, right: Joint| {
            Some((angles.get(left)? - angles.get(right)?).abs())
        };

        let contributions = [
            (w.shoulder_height, shoulder_height_diff.map(|d| d / height_scale)),
            (w.hip_height, hip_height_diff.map(|d| d / height_scale)),
            (
                w.shoulder_angle,
                angle_diff(Joint::LeftShoulder, Joint::RightShoulder).map(|d| d / angle_scale),
            ),
            (
                w.hip_angle,
                angle_diff(Joint::LeftHip, Joint::RightHip).map(|d| d / angle_scale),
            ),
            (
                w.knee_angle,
                angle_diff(Joint::LeftKnee, Joint::RightKnee).map(|d| d / angle_scale),
            ),
            (
                w.ankle_angle,
                angle_diff(Joint::LeftAnkle, Joint::RightAnkle).map(|d| d / angle_scale),
            ),
        ];

        let mut any_pair = false;
        let mut weight_sum = 0.0;
        let mut weighted = 0.0;
        for (weight, diff) in contributions {
            if let Some(diff) = diff {
                any_pair = true;
                weight_sum += weight;
                weighted += weight * diff.min(1.0);
            }
        }

        if !any_pair {
            return None;
        }

        // Available pairs may all carry zero weight
        let overall_symmetry_score =
            (weight_sum > 0.0).then(|| 1.0 - (weighted / weight_sum).clamp(0.0, 1.0));

        Some(SymmetryMetrics {
            shoulder_height_diff,
            hip_height_diff,
            shoulder_width_ratio: ratio(shoulder_width, hip_width),
            hip_width_ratio: ratio(hip_width, shoulder_width),
            overall_symmetry_score,
        })
    }
}

fn pair(left: Option<Point2>, right: Option<Point2>) -> Option<(Point2, Point2)> {
    Some((left?, right?))
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let denominator = denominator.filter(|d| *d >= EPSILON)?;
    Some(numerator? / denominator)
}
