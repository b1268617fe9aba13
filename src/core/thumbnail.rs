// Thumbnail selection and rendering
//
// The thumbnail is the frame with the most complete detection, drawn with
// its skeleton and encoded as JPEG.

use crate::core::config::Config;
use crate::models::capture::{CaptureError, DetectedFrame, RawFrame};
use crate::models::pose::{BodyLandmark, Frame, LandmarkSet};
use crate::models::report::Thumbnail;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("No frames to draw a thumbnail from")]
    NoFrames,

    #[error("Invalid frame image: {0}")]
    Frame(#[from] CaptureError),

    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

pub type ThumbnailResult<T> = Result<T, ThumbnailError>;

const LINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LEFT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const RIGHT_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const CENTER_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

pub struct ThumbnailSelector {
    quality: u8,
    max_width: Option<u32>,
    max_height: Option<u32>,
}

impl ThumbnailSelector {
    pub fn new(config: &Config) -> Self {
        Self {
            quality: config.thumbnail_quality,
            max_width: config.thumbnail_max_width,
            max_height: config.thumbnail_max_height,
        }
    }

    /// Position of the most complete frame.
    ///
    /// Completeness is the visibility sum of the present landmarks. Ties go to
    /// the frame closest to the temporal midpoint, then to the earlier frame.
    /// Returns None when no frame has any landmark.
    pub fn select(&self, frames: &[Frame]) -> Option<usize> {
        let (first, last) = (frames.first()?, frames.last()?);
        let midpoint = (first.timestamp + last.timestamp) / 2.0;

        let mut best: Option<(usize, f64, f64)> = None;
        for (position, frame) in frames.iter().enumerate() {
            let score: f64 = frame.landmarks.iter().map(|(_, l)| l.visibility).sum();
            if score <= 0.0 {
                continue;
            }
            let distance = (frame.timestamp - midpoint).abs();

            let better = match best {
                None => true,
                Some((_, best_score, best_distance)) => {
                    score > best_score || (score == best_score && distance < best_distance)
                }
            };
            if better {
                best = Some((position, score, distance));
            }
        }

        best.map(|(position, _, _)| position)
    }

    /// Pick and render the thumbnail of one video.
    ///
    /// `frames` are the normalized counterparts of `detected`, position for position.
    /// Without any detection the first frame is used as is.
    pub fn create(
        &self,
        detected: &[DetectedFrame],
        frames: &[Frame],
    ) -> ThumbnailResult<Thumbnail> {
        match self.select(frames) {
            Some(position) => {
                let source = detected.get(position).ok_or(ThumbnailError::NoFrames)?;
                let landmarks = &frames[position].landmarks;
                self.render(&source.frame.image, source.frame.index, Some(landmarks))
            }
            None => {
                let first = detected.first().ok_or(ThumbnailError::NoFrames)?;
                debug!("No landmarks in any frame, using frame {} undrawn", first.frame.index);
                self.render(&first.frame.image, first.frame.index, None)
            }
        }
    }

    /// Draw the skeleton (when given), downscale to the configured bounds and encode
    pub fn render(
        &self,
        image: &RawFrame,
        frame_index: usize,
        landmarks: Option<&LandmarkSet>,
    ) -> ThumbnailResult<Thumbnail> {
        let mut img = image.to_rgb_image()?;

        if let Some(landmarks) = landmarks {
            draw_skeleton(&mut img, landmarks);
        }

        let img = self.downscale(img);
        let (width, height) = img.dimensions();

        let mut jpeg = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, self.quality);
            encoder.encode_image(&img)?;
        }

        Ok(Thumbnail {
            frame_index,
            annotated: landmarks.is_some(),
            width,
            height,
            jpeg,
        })
    }

    fn downscale(&self, img: RgbImage) -> RgbImage {
        let (width, height) = img.dimensions();
        let max_width = self.max_width.unwrap_or(width);
        let max_height = self.max_height.unwrap_or(height);
        if width <= max_width && height <= max_height {
            return img;
        }

        let scale = f64::min(
            max_width as f64 / width as f64,
            max_height as f64 / height as f64,
        );
        let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_width);
        let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_height);

        imageops::resize(&img, new_width, new_height, FilterType::Triangle)
    }
}

fn draw_skeleton(img: &mut RgbImage, landmarks: &LandmarkSet) {
    let (width, height) = (img.width() as f32, img.height() as f32);
    let to_pixel = |id: BodyLandmark| {
        landmarks
            .get(id)
            .map(|l| (l.x as f32 * (width - 1.0), l.y as f32 * (height - 1.0)))
    };

    // Line thickness and marker size follow the image size
    let thickness = ((width.min(height) / 240.0) as i32).max(1);
    let radius = (thickness * 2).max(2);

    for (from, to) in BodyLandmark::SKELETON {
        if let (Some(a), Some(b)) = (to_pixel(from), to_pixel(to)) {
            for offset in -thickness / 2..=thickness / 2 {
                let offset = offset as f32;
                draw_line_segment_mut(img, (a.0 + offset, a.1), (b.0 + offset, b.1), LINE_COLOR);
                draw_line_segment_mut(img, (a.0, a.1 + offset), (b.0, b.1 + offset), LINE_COLOR);
            }
        }
    }

    for (id, _) in landmarks.iter() {
        if let Some((x, y)) = to_pixel(id) {
            let name = id.to_string();
            let color = if name.starts_with("left") {
                LEFT_COLOR
            } else if name.starts_with("right") {
                RIGHT_COLOR
            } else {
                CENTER_COLOR
            };
            let center = (x.round() as i32, y.round() as i32);
            draw_filled_circle_mut(img, center, radius, color);
            draw_hollow_circle_mut(img, center, radius + 1, OUTLINE_COLOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::capture::{PixelFormat, VideoFrame};
    use crate::models::pose::{Landmark, RawDetection};

    fn frame(index: usize, visibilities: &[f64]) -> Frame {
        Frame {
            index,
            timestamp: index as f64 * 0.5,
            landmarks: visibilities
                .iter()
                .enumerate()
                .map(|(i, v)| (BodyLandmark::ALL[i], Landmark::new(0.5, 0.5, *v)))
                .collect(),
        }
    }

    fn detected(index: usize) -> DetectedFrame {
        DetectedFrame {
            frame: VideoFrame {
                index,
                timestamp: index as f64 * 0.5,
                image: RawFrame::solid(64, 48, [40, 40, 40]),
            },
            detection: RawDetection::empty(64, 48),
        }
    }

    fn selector() -> ThumbnailSelector {
        ThumbnailSelector::new(&Config::default())
    }

    #[test]
    fn test_selects_most_complete_frame() {
        let frames = vec![
            frame(0, &[0.9, 0.9]),
            frame(1, &[0.9, 0.9, 0.9]),
            frame(2, &[0.6]),
        ];
        assert_eq!(selector().select(&frames), Some(1));
    }

    #[test]
    fn test_ties_prefer_temporal_midpoint() {
        let frames: Vec<Frame> = (0..9).map(|i| frame(i, &[0.8, 0.8])).collect();
        assert_eq!(selector().select(&frames), Some(4));

        // Equidistant candidates resolve to the earlier frame
        let frames = vec![frame(0, &[]), frame(1, &[0.7]), frame(2, &[0.7]), frame(3, &[])];
        assert_eq!(selector().select(&frames), Some(1));
    }

    #[test]
    fn test_no_landmarks_selects_nothing() {
        let frames: Vec<Frame> = (0..5).map(|i| frame(i, &[])).collect();
        assert_eq!(selector().select(&frames), None);
        assert_eq!(selector().select(&[]), None);
    }

    #[test]
    fn test_render_encodes_jpeg() {
        let landmarks = frame(0, &[0.9; 33]).landmarks;
        let thumbnail = selector()
            .render(&RawFrame::solid(64, 48, [0, 0, 0]), 12, Some(&landmarks))
            .unwrap();

        assert_eq!(thumbnail.frame_index, 12);
        assert!(thumbnail.annotated);
        assert_eq!((thumbnail.width, thumbnail.height), (64, 48));
        assert_eq!(&thumbnail.jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_skeleton_drawn_at_pixel_positions() {
        let landmarks: LandmarkSet = [
            (BodyLandmark::LeftShoulder, Landmark::new(0.25, 0.5, 0.9)),
            (BodyLandmark::RightShoulder, Landmark::new(0.75, 0.5, 0.9)),
            // Elbow missing, so the elbow-wrist edge has no endpoint
            (BodyLandmark::LeftWrist, Landmark::new(0.25, 0.9, 0.9)),
        ]
        .into_iter()
        .collect();

        let mut img = RgbImage::new(64, 48);
        draw_skeleton(&mut img, &landmarks);

        // Markers sit at round(x * (w - 1)), round(y * (h - 1))
        assert_eq!(img.get_pixel(16, 24), &LEFT_COLOR);
        assert_eq!(img.get_pixel(47, 24), &RIGHT_COLOR);
        assert_eq!(img.get_pixel(16, 42), &LEFT_COLOR);

        // Shoulder line passes through the middle column
        assert!((0..48).any(|y| img.get_pixel(32, y) == &LINE_COLOR));

        // Nothing connects the wrist
        for (_, y, pixel) in img.enumerate_pixels() {
            if pixel == &LINE_COLOR {
                assert!((22..=26).contains(&y), "stray edge pixel at row {}", y);
            }
        }
    }

    #[test]
    fn test_create_falls_back_to_first_frame() {
        let detected: Vec<DetectedFrame> = (0..3).map(detected).collect();
        let frames: Vec<Frame> = (0..3).map(|i| frame(i, &[])).collect();

        let thumbnail = selector().create(&detected, &frames).unwrap();
        assert_eq!(thumbnail.frame_index, 0);
        assert!(!thumbnail.annotated);
    }

    #[test]
    fn test_downscale_preserves_aspect() {
        let selector = ThumbnailSelector::new(&Config {
            thumbnail_max_width: Some(32),
            ..Config::default()
        });
        let thumbnail = selector
            .render(&RawFrame::solid(64, 48, [10, 200, 10]), 0, None)
            .unwrap();
        assert_eq!((thumbnail.width, thumbnail.height), (32, 24));

        // Never upscaled
        let small = selector.render(&RawFrame::solid(16, 8, [0, 0, 0]), 0, None).unwrap();
        assert_eq!((small.width, small.height), (16, 8));
    }

    #[test]
    fn test_bad_frame_buffer_is_an_error() {
        let image = RawFrame {
            width: 10,
            height: 10,
            data: vec![0; 12],
            format: PixelFormat::RGB8,
        };
        let err = selector().render(&image, 0, None).unwrap_err();
        assert!(matches!(err, ThumbnailError::Frame(CaptureError::BufferSizeMismatch { .. })));
    }
}
