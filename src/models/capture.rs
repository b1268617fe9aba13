// Data structures for decoded video frames and uploaded videos

use crate::models::pose::RawDetection;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A decoded video frame image
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub format: PixelFormat,
}

/// Pixel format of decoded frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    RGB8,
    RGBA8,
    BGRA8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::RGB8 => 3,
            PixelFormat::RGBA8 | PixelFormat::BGRA8 => 4,
        }
    }
}

impl RawFrame {
    /// Create a frame filled with a single RGB colour
    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixel_count * 3);
        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }

        Self {
            width,
            height,
            data,
            format: PixelFormat::RGB8,
        }
    }

    /// Convert the frame buffer to an RGB image
    pub fn to_rgb_image(&self) -> CaptureResult<RgbImage> {
        let bpp = self.format.bytes_per_pixel();
        let expected = (self.width as usize) * (self.height as usize) * bpp;
        if self.data.len() != expected {
            return Err(CaptureError::BufferSizeMismatch {
                expected,
                actual: self.data.len(),
            });
        }

        let rgb: Vec<u8> = match self.format {
            PixelFormat::RGB8 => self.data.clone(),
            PixelFormat::RGBA8 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            PixelFormat::BGRA8 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
        };

        RgbImage::from_raw(self.width, self.height, rgb).ok_or(CaptureError::BufferSizeMismatch {
            expected,
            actual: self.data.len(),
        })
    }
}

/// A frame as delivered by the frame source
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub index: usize,
    pub timestamp: f64, // Seconds from video start
    pub image: RawFrame,
}

/// A decoded frame paired with the pose detector's output for it
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedFrame {
    pub frame: VideoFrame,
    pub detection: RawDetection,
}

/// Check the frame source contract: dense indices from 0 and strictly increasing timestamps
pub fn check_frame_sequence(frames: &[DetectedFrame]) -> CaptureResult<()> {
    if frames.is_empty() {
        return Err(CaptureError::NoFrames);
    }

    let mut previous: Option<f64> = None;
    for (position, detected) in frames.iter().enumerate() {
        let frame = &detected.frame;
        if frame.index != position {
            return Err(CaptureError::NonDenseIndex {
                expected: position,
                actual: frame.index,
            });
        }
        if !frame.timestamp.is_finite() || previous.is_some_and(|p| frame.timestamp <= p) {
            return Err(CaptureError::NonIncreasingTimestamp { index: frame.index });
        }
        previous = Some(frame.timestamp);
    }

    Ok(())
}

// ==============================================================================
// Uploaded Videos
// ==============================================================================

/// Accepted video container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFormat {
    Mp4,
    Mov,
    Avi,
    Mkv,
}

impl VideoFormat {
    pub fn to_string(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Mov => "mov",
            VideoFormat::Avi => "avi",
            VideoFormat::Mkv => "mkv",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "mp4" => Some(VideoFormat::Mp4),
            "mov" => Some(VideoFormat::Mov),
            "avi" => Some(VideoFormat::Avi),
            "mkv" => Some(VideoFormat::Mkv),
            _ => None,
        }
    }

    /// Detect the container format from a file name's extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// An uploaded video file
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl VideoUpload {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Error types for frame decoding and frame buffers
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Decoding failed: {0}")]
    DecodeFailed(String),

    #[error("Video contains no decodable frames")]
    NoFrames,

    #[error("Frame index {actual} out of sequence, expected {expected}")]
    NonDenseIndex { expected: usize, actual: usize },

    #[error("Frame {index} timestamp does not increase")]
    NonIncreasingTimestamp { index: usize },

    #[error("Frame buffer has {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

pub type CaptureResult<T> = Result<T, CaptureError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn detected(index: usize, timestamp: f64) -> DetectedFrame {
        DetectedFrame {
            frame: VideoFrame {
                index,
                timestamp,
                image: RawFrame::solid(2, 2, [0, 0, 0]),
            },
            detection: RawDetection::empty(2, 2),
        }
    }

    #[test]
    fn test_video_format_from_filename() {
        assert_eq!(VideoFormat::from_filename("front.mp4"), Some(VideoFormat::Mp4));
        assert_eq!(VideoFormat::from_filename("SIDE.MOV"), Some(VideoFormat::Mov));
        assert_eq!(VideoFormat::from_filename("clip.webm"), None);
        assert_eq!(VideoFormat::from_filename("noextension"), None);
    }

    #[test]
    fn test_bgra_conversion_swaps_channels() {
        let frame = RawFrame {
            width: 1,
            height: 1,
            data: vec![10, 20, 30, 255],
            format: PixelFormat::BGRA8,
        };
        let image = frame.to_rgb_image().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [30, 20, 10]);
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let frame = RawFrame {
            width: 4,
            height: 4,
            data: vec![0; 10],
            format: PixelFormat::RGB8,
        };
        assert!(matches!(
            frame.to_rgb_image(),
            Err(CaptureError::BufferSizeMismatch { expected: 48, actual: 10 })
        ));
    }

    #[test]
    fn test_frame_sequence_contract() {
        let ok = vec![detected(0, 0.0), detected(1, 0.1), detected(2, 0.2)];
        assert!(check_frame_sequence(&ok).is_ok());

        assert!(matches!(check_frame_sequence(&[]), Err(CaptureError::NoFrames)));

        let gap = vec![detected(0, 0.0), detected(2, 0.1)];
        assert!(matches!(
            check_frame_sequence(&gap),
            Err(CaptureError::NonDenseIndex { expected: 1, actual: 2 })
        ));

        let stalled = vec![detected(0, 0.0), detected(1, 0.0)];
        assert!(matches!(
            check_frame_sequence(&stalled),
            Err(CaptureError::NonIncreasingTimestamp { index: 1 })
        ));
    }
}
