// Postural feature types: joint angles, alignment vectors and symmetry metrics
//
// Every value is optional. `None` means the inputs were not detected, never zero.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Joint Angles
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Neck,
    Spine,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const COUNT: usize = 12;

    pub const ALL: [Joint; Self::COUNT] = [
        Joint::Neck,
        Joint::Spine,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Report field name
    pub fn to_string(&self) -> &'static str {
        match self {
            Joint::Neck => "neck_angle",
            Joint::Spine => "spine_angle",
            Joint::LeftShoulder => "left_shoulder_angle",
            Joint::RightShoulder => "right_shoulder_angle",
            Joint::LeftElbow => "left_elbow_angle",
            Joint::RightElbow => "right_elbow_angle",
            Joint::LeftHip => "left_hip_angle",
            Joint::RightHip => "right_hip_angle",
            Joint::LeftKnee => "left_knee_angle",
            Joint::RightKnee => "right_knee_angle",
            Joint::LeftAnkle => "left_ankle_angle",
            Joint::RightAnkle => "right_ankle_angle",
        }
    }
}

/// Joint angles in degrees, each in [0, 180] or absent
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAngleSet {
    angles: [Option<f64>; Joint::COUNT],
}

impl JointAngleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, joint: Joint) -> Option<f64> {
        self.angles[joint.index()]
    }

    pub fn set(&mut self, joint: Joint, angle: Option<f64>) {
        self.angles[joint.index()] = angle;
    }

    pub fn is_empty(&self) -> bool {
        self.angles.iter().all(Option::is_none)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, Option<f64>)> + '_ {
        Joint::ALL.iter().map(move |j| (*j, self.angles[j.index()]))
    }
}

impl Serialize for JointAngleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Joint::COUNT))?;
        for (joint, angle) in self.iter() {
            map.serialize_entry(joint.to_string(), &angle)?;
        }
        map.end()
    }
}

// ==============================================================================
// Alignment Vectors
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    EarToShoulder,
    ShoulderToHip,
    HipToKnee,
    KneeToAnkle,
}

impl Segment {
    pub const COUNT: usize = 4;

    pub const ALL: [Segment; Self::COUNT] = [
        Segment::EarToShoulder,
        Segment::ShoulderToHip,
        Segment::HipToKnee,
        Segment::KneeToAnkle,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            Segment::EarToShoulder => "ear_to_shoulder",
            Segment::ShoulderToHip => "shoulder_to_hip",
            Segment::HipToKnee => "hip_to_knee",
            Segment::KneeToAnkle => "knee_to_ankle",
        }
    }
}

/// Displacement between two body points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentVector {
    pub dx: f64,
    pub dy: f64,
    pub magnitude: f64,
    pub angle_degrees: f64, // [0, 360)
    /// False when no body-scale reference was available and dx/dy are raw differences
    pub normalized: bool,
}

impl AlignmentVector {
    pub fn new(dx: f64, dy: f64, normalized: bool) -> Self {
        let magnitude = (dx * dx + dy * dy).sqrt();
        let mut angle_degrees = dy.atan2(dx).to_degrees();
        if angle_degrees < 0.0 {
            angle_degrees += 360.0;
        }
        // atan2 can round to exactly 360 for tiny negative dy
        if angle_degrees >= 360.0 {
            angle_degrees -= 360.0;
        }

        Self {
            dx,
            dy,
            magnitude,
            angle_degrees,
            normalized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlignmentVectorSet {
    vectors: [Option<AlignmentVector>; Segment::COUNT],
}

impl AlignmentVectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, segment: Segment) -> Option<&AlignmentVector> {
        self.vectors[segment.index()].as_ref()
    }

    pub fn set(&mut self, segment: Segment, vector: Option<AlignmentVector>) {
        self.vectors[segment.index()] = vector;
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.iter().all(Option::is_none)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Segment, Option<&AlignmentVector>)> + '_ {
        Segment::ALL
            .iter()
            .map(move |s| (*s, self.vectors[s.index()].as_ref()))
    }
}

impl Serialize for AlignmentVectorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Segment::COUNT))?;
        for (segment, vector) in self.iter() {
            map.serialize_entry(segment.to_string(), &vector)?;
        }
        map.end()
    }
}

// ==============================================================================
// Symmetry
// ==============================================================================

/// Left/right symmetry metrics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SymmetryMetrics {
    pub shoulder_height_diff: Option<f64>,
    pub hip_height_diff: Option<f64>,
    pub shoulder_width_ratio: Option<f64>,
    pub hip_width_ratio: Option<f64>,
    /// 1.0 means perfectly symmetric
    pub overall_symmetry_score: Option<f64>,
}

impl SymmetryMetrics {
    pub fn is_empty(&self) -> bool {
        self.shoulder_height_diff.is_none()
            && self.hip_height_diff.is_none()
            && self.shoulder_width_ratio.is_none()
            && self.hip_width_ratio.is_none()
            && self.overall_symmetry_score.is_none()
    }
}

/// Features computed from a single sampled frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameFeatures {
    pub joint_angles: JointAngleSet,
    pub alignment_vectors: AlignmentVectorSet,
    pub symmetry: Option<SymmetryMetrics>,
}

impl FrameFeatures {
    /// A usable frame contributes at least one feature value
    pub fn is_usable(&self) -> bool {
        !self.joint_angles.is_empty()
            || !self.alignment_vectors.is_empty()
            || self.symmetry.is_some_and(|s| !s.is_empty())
    }
}
