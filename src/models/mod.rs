// Data models for landmarks, decoded frames, postural features and reports

pub mod capture;
pub mod features;
pub mod pose;
pub mod report;
