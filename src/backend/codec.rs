//! Lossy raster codec.

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, ImageFormat};

use crate::error::{Error, Result};

/// Encodes pixel buffers into a lossy stream and decodes them back.
pub trait Codec: Send + Sync {
    /// Encode at a fidelity in `[0, 1]`.
    fn encode(&self, image: &DynamicImage, quality: f32) -> Result<Vec<u8>>;

    /// Decode a stream produced by [`Codec::encode`].
    fn decode(&self, data: &[u8]) -> Result<DynamicImage>;
}

/// Baseline JPEG via the `image` crate.
///
/// Gray rasters are written as single-channel JPEG; everything else is
/// flattened to 8-bit RGB.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec;

impl JpegCodec {
    /// Create a JPEG codec.
    pub fn new() -> Self {
        Self
    }
}

/// Map a `[0, 1]` quality onto the encoder's 1..=100 scale.
pub(crate) fn jpeg_quality(quality: f32) -> u8 {
    let scaled = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
    scaled.max(1)
}

impl Codec for JpegCodec {
    fn encode(&self, image: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(Error::Encode("raster has no pixels".to_string()));
        }

        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality(quality));
        let written = match image {
            DynamicImage::ImageLuma8(gray) => {
                encoder.write_image(gray.as_raw(), width, height, ColorType::L8.into())
            }
            other => {
                let rgb = other.to_rgb8();
                encoder.write_image(rgb.as_raw(), width, height, ColorType::Rgb8.into())
            }
        };
        written.map_err(|e| Error::Encode(e.to_string()))?;

        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory_with_format(data, ImageFormat::Jpeg)
            .map_err(|e| Error::Decode(e.to_string()))
    }
}
