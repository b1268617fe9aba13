pub mod config;

// Per-frame feature extraction
pub mod geometry;
pub mod landmark_normalizer;
pub mod angle_calculator;
pub mod alignment;
pub mod symmetry;

// Per-video aggregation and thumbnails
pub mod frame_aggregator;
pub mod thumbnail;
pub mod video_pipeline;

// Multi-angle orchestration
pub mod merger;
