//! Capture-buffer encoding.

use base64::{engine::general_purpose, Engine as _};
use std::io::Cursor;
use thiserror::Error;

/// Raw pixels handed back by the capture adapter, RGBA8, row-major.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub image_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Image buffer dimension mismatch: {0}x{1} with {2} bytes")]
    DimensionMismatch(u32, u32, usize),
    #[error("Image encoding error: {0}")]
    Encoding(String),
}

impl CaptureResult {
    /// Encode as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>, EncodeError> {
        use image::codecs::png::PngEncoder;
        use image::{ExtendedColorType, ImageEncoder};

        self.check_dimensions()?;
        let mut png_data = Vec::new();
        let encoder = PngEncoder::new(Cursor::new(&mut png_data));
        encoder
            .write_image(
                &self.image_data,
                self.width,
                self.height,
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| EncodeError::Encoding(e.to_string()))?;
        Ok(png_data)
    }

    /// Encode as JPEG bytes. JPEG has no alpha channel, so the buffer is
    /// flattened to RGB first.
    pub fn to_jpeg(&self) -> Result<Vec<u8>, EncodeError> {
        use image::codecs::jpeg::JpegEncoder;
        use image::{ExtendedColorType, ImageEncoder};

        self.check_dimensions()?;
        let rgb: Vec<u8> = self
            .image_data
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        let mut jpeg_data = Vec::new();
        let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut jpeg_data), 85);
        encoder
            .write_image(&rgb, self.width, self.height, ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::Encoding(e.to_string()))?;
        Ok(jpeg_data)
    }

    /// Base64 of the PNG encoding, for JSON envelopes.
    pub fn to_base64_png(&self) -> Result<String, EncodeError> {
        Ok(general_purpose::STANDARD.encode(self.to_png()?))
    }

    fn check_dimensions(&self) -> Result<(), EncodeError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.image_data.len() != expected {
            return Err(EncodeError::DimensionMismatch(
                self.width,
                self.height,
                self.image_data.len(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> CaptureResult {
        CaptureResult {
            image_data: vec![128; (width * height * 4) as usize],
            width,
            height,
        }
    }

    #[test]
    fn png_round_trip_preserves_dimensions() {
        let capture = solid(8, 6);
        let png = capture.to_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 6);
    }

    #[test]
    fn jpeg_encodes_without_alpha() {
        let capture = solid(8, 6);
        let jpeg = capture.to_jpeg().unwrap();
        // JPEG magic
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let capture = CaptureResult {
            image_data: vec![0; 10],
            width: 8,
            height: 6,
        };
        assert!(capture.to_png().is_err());
    }
}
