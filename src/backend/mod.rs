//! Collaborator seams: rasterizer, codec, and assembler.
//!
//! The controller only talks to these traits. Each ships with one concrete
//! implementation; tests and embedders can substitute their own.

pub(crate) mod assembler;
mod codec;
mod rasterizer;

pub use assembler::{Assembler, ImagePdfWriter, LopdfAssembler, PageColor, RenderedPage};
pub use codec::{Codec, JpegCodec};
pub use rasterizer::{PdftoppmRasterizer, Rasterizer};

/// Raster types exchanged between the rasterizer and the codec.
pub use image::{DynamicImage, Rgb, RgbImage};
