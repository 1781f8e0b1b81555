//! Captured still frame

use std::io::Cursor;

use anyhow::{Context, Result, bail};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};

/// A frame frozen from the live video, as the compressed still and its decoded pixels
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    pub jpeg: Vec<u8>,
    pub still: DynamicImage,
}

impl CapturedFrame {
    /// Compress a raw frame to JPEG at `quality` (1-100) and decode it back for cropping
    pub fn encode(rgba: &RgbaImage, quality: u8) -> Result<Self> {
        if rgba.width() == 0 || rgba.height() == 0 {
            bail!("Video has no frame yet ({}x{})", rgba.width(), rgba.height());
        }

        let rgb = DynamicImage::ImageRgba8(rgba.clone()).to_rgb8();
        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .context("Failed to encode captured frame")?;

        let still = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)
            .context("Failed to decode captured still")?;

        log::debug!(
            "Captured still: {}x{} pixels, {} bytes",
            still.width(),
            still.height(),
            jpeg.len()
        );
        Ok(Self { jpeg, still })
    }

    /// Get the width of the still
    pub fn width(&self) -> u32 {
        self.still.width()
    }

    /// Get the height of the still
    pub fn height(&self) -> u32 {
        self.still.height()
    }

    /// Sniff the container format of the stored bytes
    pub fn format(&self) -> Option<ImageFormat> {
        image::ImageReader::new(Cursor::new(&self.jpeg))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_encode_keeps_native_resolution() {
        let raw = RgbaImage::from_pixel(64, 48, Rgba([200, 100, 50, 255]));
        let frame = CapturedFrame::encode(&raw, 90).unwrap();
        assert_eq!((frame.width(), frame.height()), (64, 48));
        assert_eq!(frame.format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let mut raw = RgbaImage::new(128, 128);
        for (x, y, pixel) in raw.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 2) as u8, (y * 2) as u8, ((x ^ y) * 3) as u8, 255]);
        }
        let high = CapturedFrame::encode(&raw, 95).unwrap();
        let low = CapturedFrame::encode(&raw, 20).unwrap();
        assert!(low.jpeg.len() < high.jpeg.len());
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        assert!(CapturedFrame::encode(&RgbaImage::new(0, 0), 90).is_err());
    }
}
