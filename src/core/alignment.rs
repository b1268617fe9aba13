// Alignment vectors between body-centre points, scaled by a body length

use crate::core::config::ScaleReference;
use crate::core::geometry::{BodyPoint, EPSILON};
use crate::models::features::{AlignmentVector, AlignmentVectorSet, Segment};
use crate::models::pose::{BodyLandmark as L, LandmarkSet};

const EAR_CENTER: BodyPoint = BodyPoint::Center(L::LeftEar, L::RightEar);
const SHOULDER_CENTER: BodyPoint = BodyPoint::Center(L::LeftShoulder, L::RightShoulder);
const HIP_CENTER: BodyPoint = BodyPoint::Center(L::LeftHip, L::RightHip);
const KNEE_CENTER: BodyPoint = BodyPoint::Center(L::LeftKnee, L::RightKnee);
const ANKLE_CENTER: BodyPoint = BodyPoint::Center(L::LeftAnkle, L::RightAnkle);

impl Segment {
    /// Start and end point of the segment
    pub fn endpoints(&self) -> (BodyPoint, BodyPoint) {
        match self {
            Segment::EarToShoulder => (EAR_CENTER, SHOULDER_CENTER),
            Segment::ShoulderToHip => (SHOULDER_CENTER, HIP_CENTER),
            Segment::HipToKnee => (HIP_CENTER, KNEE_CENTER),
            Segment::KneeToAnkle => (KNEE_CENTER, ANKLE_CENTER),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AlignmentCalculator {
    scale_reference: ScaleReference,
}

impl AlignmentCalculator {
    pub fn new(scale_reference: ScaleReference) -> Self {
        Self { scale_reference }
    }

    /// Body-scale length for this frame, if measurable
    pub fn reference_length(&self, landmarks: &LandmarkSet) -> Option<f64> {
        let length = match self.scale_reference {
            ScaleReference::TorsoLength => {
                let shoulders = SHOULDER_CENTER.resolve(landmarks)?;
                let hips = HIP_CENTER.resolve(landmarks)?;
                shoulders.distance(hips)
            }
            ScaleReference::ShoulderWidth => {
                let left = BodyPoint::Landmark(L::LeftShoulder).resolve(landmarks)?;
                let right = BodyPoint::Landmark(L::RightShoulder).resolve(landmarks)?;
                left.distance(right)
            }
        };

        (length >= EPSILON).then_some(length)
    }

    /// Compute the alignment vector of every segment whose endpoints are present.
    ///
    /// Without a usable reference length the raw differences are kept and
    /// marked `normalized = false`.
    pub fn calculate(&self, landmarks: &LandmarkSet) -> AlignmentVectorSet {
        let reference = self.reference_length(landmarks);
        let mut vectors = AlignmentVectorSet::new();

        for segment in Segment::ALL {
            let (start, end) = segment.endpoints();
            let vector = match (start.resolve(landmarks), end.resolve(landmarks)) {
                (Some(p), Some(q)) => {
                    let (dx, dy) = (q.x - p.x, q.y - p.y);
                    Some(match reference {
                        Some(scale) => AlignmentVector::new(dx / scale, dy / scale, true),
                        None => AlignmentVector::new(dx, dy, false),
                    })
                }
                _ => None,
            };
            vectors.set(segment, vector);
        }

        vectors
    }
}
