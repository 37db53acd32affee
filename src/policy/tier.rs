//! Compression tier catalogues.

use serde::Serialize;

/// One set of rendering and encoding parameters applied to a whole trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionTier {
    /// Rasterization resolution in dots per inch.
    pub dpi: u32,
    /// Lossy encoder quality in `[0, 1]`.
    pub quality: f32,
    /// Downscale factor in `(0, 1]` applied to text-like pages.
    pub scale: f32,
    /// Convert text-like pages to single-channel gray.
    pub grayscale: bool,
}

impl CompressionTier {
    /// Create a tier.
    pub const fn new(dpi: u32, quality: f32, scale: f32, grayscale: bool) -> Self {
        Self {
            dpi,
            quality,
            scale,
            grayscale,
        }
    }
}

impl std::fmt::Display for CompressionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} dpi, q{:.2}, x{:.2}{}",
            self.dpi,
            self.quality,
            self.scale,
            if self.grayscale { ", gray" } else { "" }
        )
    }
}

/// Tiers tried in order by the iterative search, mild to aggressive.
pub const SEARCH_TIERS: [CompressionTier; 4] = [
    CompressionTier::new(120, 0.70, 1.00, false),
    CompressionTier::new(90, 0.55, 0.95, false),
    CompressionTier::new(70, 0.40, 0.88, false),
    CompressionTier::new(50, 0.25, 0.85, true),
];

/// Single-pass tier bands, chosen from the `target / original` size ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectBand {
    /// ratio >= 0.60
    Mild,
    /// ratio >= 0.30
    Medium,
    /// ratio >= 0.15
    Strong,
    /// Anything smaller; the only band that allows grayscale.
    Ultra,
}

impl DirectBand {
    /// Pick the band for a target-to-original size ratio.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.60 {
            DirectBand::Mild
        } else if ratio >= 0.30 {
            DirectBand::Medium
        } else if ratio >= 0.15 {
            DirectBand::Strong
        } else {
            DirectBand::Ultra
        }
    }

    /// The tier this band maps to.
    pub fn tier(self) -> CompressionTier {
        match self {
            DirectBand::Mild => CompressionTier::new(110, 0.70, 1.00, false),
            DirectBand::Medium => CompressionTier::new(90, 0.55, 0.95, false),
            DirectBand::Strong => CompressionTier::new(80, 0.40, 0.90, false),
            DirectBand::Ultra => CompressionTier::new(70, 0.30, 0.85, true),
        }
    }
}

impl std::fmt::Display for DirectBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DirectBand::Mild => "mild",
            DirectBand::Medium => "medium",
            DirectBand::Strong => "strong",
            DirectBand::Ultra => "ultra",
        };
        f.write_str(name)
    }
}
