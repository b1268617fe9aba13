// Frame source integration
// Turns uploaded video bytes into an ordered sequence of decoded frames

use crate::models::capture::{CaptureError, CaptureResult, PixelFormat, RawFrame, VideoFrame};

/// Frame source trait
///
/// Implementations must yield frames with indices dense from 0 and strictly
/// increasing timestamps. Blocking; called from a worker thread.
pub trait FrameSource: Send + Sync {
    fn decode(&self, data: &[u8]) -> CaptureResult<Vec<VideoFrame>>;
}

/// Decodes a single still image (PNG, JPEG, ...) as a one-frame video
#[derive(Debug, Default)]
pub struct StillImageSource;

impl StillImageSource {
    pub fn new() -> Self {
        Self
    }
}

impl FrameSource for StillImageSource {
    fn decode(&self, data: &[u8]) -> CaptureResult<Vec<VideoFrame>> {
        let image = image::load_from_memory(data)
            .map_err(|e| CaptureError::DecodeFailed(e.to_string()))?
            .to_rgb8();

        let (width, height) = image.dimensions();
        Ok(vec![VideoFrame {
            index: 0,
            timestamp: 0.0,
            image: RawFrame {
                width,
                height,
                data: image.into_raw(),
                format: PixelFormat::RGB8,
            },
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    #[test]
    fn test_still_image_decodes_to_one_frame() {
        let mut png = Vec::new();
        RgbImage::from_pixel(8, 6, Rgb([10, 20, 30]))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let frames = StillImageSource::new().decode(&png).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].index, 0);
        assert_eq!((frames[0].image.width, frames[0].image.height), (8, 6));
        assert_eq!(&frames[0].image.data[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let result = StillImageSource::new().decode(b"not a video");
        assert!(matches!(result, Err(CaptureError::DecodeFailed(_))));
    }
}
