//! Single-page transcoding.

use std::sync::Arc;

use image::imageops::FilterType;
use image::DynamicImage;

use crate::backend::{Codec, PageColor, Rasterizer, RenderedPage};
use crate::document::{PageClassification, PdfSource};
use crate::error::{Error, Result};
use crate::policy::CompressionTier;

/// Quality bump applied to image-heavy pages.
const IMAGE_HEAVY_QUALITY_BOOST: f32 = 0.10;

/// Applies one tier to one page through the rasterizer and codec.
#[derive(Clone)]
pub struct PageTranscoder {
    rasterizer: Arc<dyn Rasterizer>,
    codec: Arc<dyn Codec>,
}

impl PageTranscoder {
    /// Create a transcoder over the given collaborators.
    pub fn new(rasterizer: Arc<dyn Rasterizer>, codec: Arc<dyn Codec>) -> Self {
        Self { rasterizer, codec }
    }

    /// Render, adjust, encode and re-decode a single page.
    ///
    /// Grayscale conversion and downscaling only ever touch text-like pages;
    /// image-heavy pages keep their color and full rendered size.
    pub fn transcode(
        &self,
        source: &PdfSource<'_>,
        page_index: usize,
        tier: &CompressionTier,
        classification: PageClassification,
    ) -> Result<RenderedPage> {
        let raster = self
            .rasterizer
            .render(source, page_index, tier.dpi)
            .map_err(|e| e.into_render(page_index))?;
        let raster = prepare_raster(raster, tier, classification);

        let data = self
            .codec
            .encode(&raster, effective_quality(tier, classification))
            .map_err(Error::into_encode)?;
        drop(raster);

        let decoded = self.codec.decode(&data).map_err(Error::into_decode)?;
        let color = if decoded.color().has_color() {
            PageColor::Rgb
        } else {
            PageColor::Gray
        };

        Ok(RenderedPage {
            index: page_index,
            data,
            width: decoded.width(),
            height: decoded.height(),
            color,
        })
    }
}

/// Encoder quality for a page under a tier.
pub fn effective_quality(tier: &CompressionTier, classification: PageClassification) -> f32 {
    match classification {
        PageClassification::ImageHeavy => (tier.quality + IMAGE_HEAVY_QUALITY_BOOST).min(1.0),
        PageClassification::TextLike => tier.quality,
    }
}

/// Pixel size after downscaling, floored and never below 1x1.
pub fn scaled_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    // Tier scales are decimal constants; snap the f32 to 1/10000 and floor
    // in integers so 0.95f32 never lands one pixel short.
    let per_myriad = (f64::from(scale) * 10_000.0).round().max(0.0) as u64;
    let apply = |v: u32| ((u64::from(v) * per_myriad / 10_000) as u32).max(1);
    (apply(width), apply(height))
}

pub(crate) fn prepare_raster(
    raster: DynamicImage,
    tier: &CompressionTier,
    classification: PageClassification,
) -> DynamicImage {
    if classification.is_image_heavy() {
        return raster;
    }

    let raster = if tier.grayscale {
        DynamicImage::ImageLuma8(raster.to_luma8())
    } else {
        raster
    };

    if tier.scale < 1.0 {
        let (width, height) = scaled_dimensions(raster.width(), raster.height(), tier.scale);
        raster.resize_exact(width, height, FilterType::Triangle)
    } else {
        raster
    }
}
