// Joint angle calculation from a frame's landmarks

use crate::core::geometry::{angle_at_vertex, BodyPoint};
use crate::models::features::{Joint, JointAngleSet};
use crate::models::pose::{BodyLandmark as L, LandmarkSet};

/// Landmark triple (A, B, C) whose angle is measured at vertex B
pub struct JointTriple {
    pub joint: Joint,
    pub a: BodyPoint,
    pub vertex: BodyPoint,
    pub c: BodyPoint,
}

impl JointTriple {
    pub fn measure(&self, landmarks: &LandmarkSet) -> Option<f64> {
        let a = self.a.resolve(landmarks)?;
        let b = self.vertex.resolve(landmarks)?;
        let c = self.c.resolve(landmarks)?;
        angle_at_vertex(a, b, c)
    }
}

const fn lm(id: L) -> BodyPoint {
    BodyPoint::Landmark(id)
}

const fn triple(joint: Joint, a: BodyPoint, vertex: BodyPoint, c: BodyPoint) -> JointTriple {
    JointTriple { joint, a, vertex, c }
}

const EAR_MID: BodyPoint = BodyPoint::Midpoint(L::LeftEar, L::RightEar);
const SHOULDER_MID: BodyPoint = BodyPoint::Midpoint(L::LeftShoulder, L::RightShoulder);
const HIP_MID: BodyPoint = BodyPoint::Midpoint(L::LeftHip, L::RightHip);
const KNEE_MID: BodyPoint = BodyPoint::Midpoint(L::LeftKnee, L::RightKnee);

pub const JOINT_TRIPLES: [JointTriple; Joint::COUNT] = [
    triple(Joint::Neck, EAR_MID, SHOULDER_MID, HIP_MID),
    triple(Joint::Spine, SHOULDER_MID, HIP_MID, KNEE_MID),
    triple(Joint::LeftShoulder, lm(L::LeftEar), lm(L::LeftShoulder), lm(L::LeftElbow)),
    triple(Joint::RightShoulder, lm(L::RightEar), lm(L::RightShoulder), lm(L::RightElbow)),
    triple(Joint::LeftElbow, lm(L::LeftShoulder), lm(L::LeftElbow), lm(L::LeftWrist)),
    triple(Joint::RightElbow, lm(L::RightShoulder), lm(L::RightElbow), lm(L::RightWrist)),
    triple(Joint::LeftHip, lm(L::LeftShoulder), lm(L::LeftHip), lm(L::LeftKnee)),
    triple(Joint::RightHip, lm(L::RightShoulder), lm(L::RightHip), lm(L::RightKnee)),
    triple(Joint::LeftKnee, lm(L::LeftHip), lm(L::LeftKnee), lm(L::LeftAnkle)),
    triple(Joint::RightKnee, lm(L::RightHip), lm(L::RightKnee), lm(L::RightAnkle)),
    triple(Joint::LeftAnkle, lm(L::LeftKnee), lm(L::LeftAnkle), lm(L::LeftFootIndex)),
    triple(Joint::RightAnkle, lm(L::RightKnee), lm(L::RightAnkle), lm(L::RightFootIndex)),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct AngleCalculator;

impl AngleCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute every joint angle the frame's landmarks allow
    pub fn calculate(&self, landmarks: &LandmarkSet) -> JointAngleSet {
        let mut angles = JointAngleSet::new();

        for triple in &JOINT_TRIPLES {
            angles.set(triple.joint, triple.measure(landmarks));
        }

        angles
    }
}
