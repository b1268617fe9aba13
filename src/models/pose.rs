// Data models for body landmarks as produced by the pose detector

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Body Landmarks (33 keypoints)
// ==============================================================================

/// MediaPipe Pose Landmark indices (33 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    pub const COUNT: usize = 33;

    pub const ALL: [BodyLandmark; Self::COUNT] = [
        BodyLandmark::Nose,
        BodyLandmark::LeftEyeInner,
        BodyLandmark::LeftEye,
        BodyLandmark::LeftEyeOuter,
        BodyLandmark::RightEyeInner,
        BodyLandmark::RightEye,
        BodyLandmark::RightEyeOuter,
        BodyLandmark::LeftEar,
        BodyLandmark::RightEar,
        BodyLandmark::MouthLeft,
        BodyLandmark::MouthRight,
        BodyLandmark::LeftShoulder,
        BodyLandmark::RightShoulder,
        BodyLandmark::LeftElbow,
        BodyLandmark::RightElbow,
        BodyLandmark::LeftWrist,
        BodyLandmark::RightWrist,
        BodyLandmark::LeftPinky,
        BodyLandmark::RightPinky,
        BodyLandmark::LeftIndex,
        BodyLandmark::RightIndex,
        BodyLandmark::LeftThumb,
        BodyLandmark::RightThumb,
        BodyLandmark::LeftHip,
        BodyLandmark::RightHip,
        BodyLandmark::LeftKnee,
        BodyLandmark::RightKnee,
        BodyLandmark::LeftAnkle,
        BodyLandmark::RightAnkle,
        BodyLandmark::LeftHeel,
        BodyLandmark::RightHeel,
        BodyLandmark::LeftFootIndex,
        BodyLandmark::RightFootIndex,
    ];

    /// Skeleton edges drawn on thumbnails
    pub const SKELETON: [(BodyLandmark, BodyLandmark); 21] = [
        // Head and neck
        (BodyLandmark::LeftEar, BodyLandmark::LeftShoulder),
        (BodyLandmark::RightEar, BodyLandmark::RightShoulder),
        (BodyLandmark::LeftEye, BodyLandmark::RightEye),
        // Shoulders and arms
        (BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder),
        (BodyLandmark::LeftShoulder, BodyLandmark::LeftElbow),
        (BodyLandmark::RightShoulder, BodyLandmark::RightElbow),
        (BodyLandmark::LeftElbow, BodyLandmark::LeftWrist),
        (BodyLandmark::RightElbow, BodyLandmark::RightWrist),
        // Torso
        (BodyLandmark::LeftShoulder, BodyLandmark::LeftHip),
        (BodyLandmark::RightShoulder, BodyLandmark::RightHip),
        (BodyLandmark::LeftHip, BodyLandmark::RightHip),
        // Legs
        (BodyLandmark::LeftHip, BodyLandmark::LeftKnee),
        (BodyLandmark::RightHip, BodyLandmark::RightKnee),
        (BodyLandmark::LeftKnee, BodyLandmark::LeftAnkle),
        (BodyLandmark::RightKnee, BodyLandmark::RightAnkle),
        // Feet
        (BodyLandmark::LeftAnkle, BodyLandmark::LeftHeel),
        (BodyLandmark::RightAnkle, BodyLandmark::RightHeel),
        (BodyLandmark::LeftHeel, BodyLandmark::LeftFootIndex),
        (BodyLandmark::RightHeel, BodyLandmark::RightFootIndex),
        (BodyLandmark::LeftAnkle, BodyLandmark::LeftFootIndex),
        (BodyLandmark::RightAnkle, BodyLandmark::RightFootIndex),
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            BodyLandmark::Nose => "nose",
            BodyLandmark::LeftEyeInner => "left_eye_inner",
            BodyLandmark::LeftEye => "left_eye",
            BodyLandmark::LeftEyeOuter => "left_eye_outer",
            BodyLandmark::RightEyeInner => "right_eye_inner",
            BodyLandmark::RightEye => "right_eye",
            BodyLandmark::RightEyeOuter => "right_eye_outer",
            BodyLandmark::LeftEar => "left_ear",
            BodyLandmark::RightEar => "right_ear",
            BodyLandmark::MouthLeft => "mouth_left",
            BodyLandmark::MouthRight => "mouth_right",
            BodyLandmark::LeftShoulder => "left_shoulder",
            BodyLandmark::RightShoulder => "right_shoulder",
            BodyLandmark::LeftElbow => "left_elbow",
            BodyLandmark::RightElbow => "right_elbow",
            BodyLandmark::LeftWrist => "left_wrist",
            BodyLandmark::RightWrist => "right_wrist",
            BodyLandmark::LeftPinky => "left_pinky",
            BodyLandmark::RightPinky => "right_pinky",
            BodyLandmark::LeftIndex => "left_index",
            BodyLandmark::RightIndex => "right_index",
            BodyLandmark::LeftThumb => "left_thumb",
            BodyLandmark::RightThumb => "right_thumb",
            BodyLandmark::LeftHip => "left_hip",
            BodyLandmark::RightHip => "right_hip",
            BodyLandmark::LeftKnee => "left_knee",
            BodyLandmark::RightKnee => "right_knee",
            BodyLandmark::LeftAnkle => "left_ankle",
            BodyLandmark::RightAnkle => "right_ankle",
            BodyLandmark::LeftHeel => "left_heel",
            BodyLandmark::RightHeel => "right_heel",
            BodyLandmark::LeftFootIndex => "left_foot_index",
            BodyLandmark::RightFootIndex => "right_foot_index",
        }
    }
}

// ==============================================================================
// Normalized Landmarks
// ==============================================================================

/// A landmark position in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64, // Normalized [0, 1]
    pub y: f64, // Normalized [0, 1]
    pub z: Option<f64>, // Relative depth, when the detector provides one
    pub visibility: f64, // Detection confidence [0, 1]
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility,
        }
    }

    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility >= threshold
    }
}

/// One frame's landmarks, keyed by `BodyLandmark`. Missing entries were not detected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSet {
    points: [Option<Landmark>; BodyLandmark::COUNT],
}

impl Default for LandmarkSet {
    fn default() -> Self {
        Self {
            points: [None; BodyLandmark::COUNT],
        }
    }
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, landmark: BodyLandmark) -> Option<&Landmark> {
        self.points[landmark.index()].as_ref()
    }

    pub fn insert(&mut self, landmark: BodyLandmark, point: Landmark) {
        self.points[landmark.index()] = Some(point);
    }

    pub fn remove(&mut self, landmark: BodyLandmark) -> Option<Landmark> {
        self.points[landmark.index()].take()
    }

    pub fn contains(&self, landmark: BodyLandmark) -> bool {
        self.points[landmark.index()].is_some()
    }

    pub fn len(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Present landmarks in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (BodyLandmark, &Landmark)> {
        BodyLandmark::ALL
            .iter()
            .zip(self.points.iter())
            .filter_map(|(id, point)| point.as_ref().map(|p| (*id, p)))
    }
}

impl FromIterator<(BodyLandmark, Landmark)> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = (BodyLandmark, Landmark)>>(iter: I) -> Self {
        let mut set = LandmarkSet::new();
        for (id, point) in iter {
            set.insert(id, point);
        }
        set
    }
}

impl Serialize for LandmarkSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(BodyLandmark::COUNT))?;
        for id in BodyLandmark::ALL {
            map.serialize_entry(id.to_string(), &self.points[id.index()])?;
        }
        map.end()
    }
}

/// A sampled video frame after normalization
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: usize,
    pub timestamp: f64, // Seconds from video start
    pub landmarks: LandmarkSet,
}

// ==============================================================================
// Raw Detector Output
// ==============================================================================

/// Coordinate space of the positions a detector reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    Pixel,
    Normalized,
}

/// A single landmark as reported by the pose detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawLandmark {
    pub landmark: BodyLandmark,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub visibility: f64,
}

/// Pose detector output for one decoded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub width: u32,
    pub height: u32,
    pub space: CoordinateSpace,
    pub landmarks: Vec<RawLandmark>, // 0..33 detections
}

impl RawDetection {
    /// A detection that found nobody in the image
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            space: CoordinateSpace::Pixel,
            landmarks: Vec::new(),
        }
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

pub type PoseResult<T> = Result<T, PoseError>;
