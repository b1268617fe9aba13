// Collaborator abstractions: video decoding and pose detection

pub mod capture;
pub mod pose;

pub use capture::{FrameSource, StillImageSource};
pub use pose::{NullPoseDetector, PoseDetector};
