//! Shared fixtures for integration tests.
//!
//! Nothing here needs poppler: documents are built with lopdf and pages are
//! "rendered" by [`StubRasterizer`].

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use lopdf::{dictionary, Document, Object, Stream};
use pdfsqueeze::backend::DynamicImage;
use pdfsqueeze::{Codec, Error, PageInspector, PdfSource, Rasterizer, Result};

/// How a fixture page is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Content stream only.
    Text,
    /// References a 1x1 image XObject.
    Scanned,
    /// References an XObject that does not exist.
    Broken,
}

/// Builds a PDF with one page per entry, `(kind, width_pt, height_pt)`.
pub fn build_pdf(pages: &[(PageKind, u32, u32)]) -> Vec<u8> {
    build_pdf_padded(pages, 0)
}

/// Like [`build_pdf`], plus an unreferenced stream of `padding` bytes that
/// only inflates the input size.
pub fn build_pdf_padded(pages: &[(PageKind, u32, u32)], padding: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0x80],
    ));

    let mut kids = Vec::new();
    for (kind, width, height) in pages {
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"BT /F1 12 Tf 72 712 Td (Hello) Tj ET".to_vec(),
        ));
        let resources = match kind {
            PageKind::Text => dictionary! {},
            PageKind::Scanned => dictionary! { "XObject" => dictionary! { "Im0" => image_id } },
            PageKind::Broken => {
                dictionary! { "XObject" => dictionary! { "Im0" => Object::Reference((9999, 0)) } }
            }
        };
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (*width as i64).into(), (*height as i64).into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if padding > 0 {
        doc.add_object(Stream::new(dictionary! {}, vec![b'x'; padding]));
    }

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save fixture");
    out
}

/// `count` pages of one kind, each 72x72 points.
pub fn uniform_pdf(kind: PageKind, count: usize) -> Vec<u8> {
    build_pdf(&vec![(kind, 72, 72); count])
}

/// `count` pages of one kind, each 72x72 points, at least `min_size` bytes.
pub fn padded_pdf(kind: PageKind, count: usize, min_size: usize) -> Vec<u8> {
    build_pdf_padded(&vec![(kind, 72, 72); count], min_size)
}

/// Pixel size a page of `points` renders to at `dpi`.
pub fn pixels(points: f32, dpi: u32) -> u32 {
    ((points * dpi as f32 / 72.0).round() as u32).max(1)
}

/// Renders a flat RGB raster sized from the page's MediaBox.
#[derive(Default)]
pub struct StubRasterizer {
    /// Pages listed here fail to render.
    pub failing_pages: Vec<usize>,
    /// Fail every call whose dpi is listed here.
    pub failing_dpis: Vec<u32>,
    /// Fail every call whose dpi is listed here with an I/O error.
    pub io_failing_dpis: Vec<u32>,
    /// Sleep `(page_count - index) * delay` before returning, so that later
    /// pages finish first on a pool.
    pub reverse_delay: Option<Duration>,
    /// Every `(page, dpi)` rendered, in call order.
    pub calls: Mutex<Vec<(usize, u32)>>,
}

impl StubRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(usize, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Rasterizer for StubRasterizer {
    fn render(&self, source: &PdfSource<'_>, page_index: usize, dpi: u32) -> Result<DynamicImage> {
        self.calls.lock().unwrap().push((page_index, dpi));

        if let Some(delay) = self.reverse_delay {
            let remaining = (source.page_count() - page_index) as u32;
            thread::sleep(delay * remaining);
        }
        if self.failing_pages.contains(&page_index) || self.failing_dpis.contains(&dpi) {
            return Err(Error::Render {
                page: page_index,
                message: "stub failure".to_string(),
            });
        }

        if self.io_failing_dpis.contains(&dpi) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::Other,
                "render tmp write failed",
            )));
        }

        let (width, height) = source.page_size(page_index)?;
        Ok(DynamicImage::new_rgb8(pixels(width, dpi), pixels(height, dpi)))
    }
}

const STUB_MAGIC: &[u8; 4] = b"STUB";

/// What [`AreaCodec`] was asked to encode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeCall {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub quality: f32,
}

/// Fake codec whose output length is proportional to pixel area x quality.
///
/// The stream carries its dimensions and channel count in a small header so
/// `decode` can rebuild a blank raster of the right shape.
pub struct AreaCodec {
    factor: f32,
    pub calls: Mutex<Vec<EncodeCall>>,
}

impl AreaCodec {
    pub fn new() -> Self {
        Self::with_factor(1.0)
    }

    /// Bytes per (pixel x channel x quality).
    pub fn with_factor(factor: f32) -> Self {
        Self {
            factor,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<EncodeCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Codec for AreaCodec {
    fn encode(&self, image: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
        let (width, height) = (image.width(), image.height());
        let channels: u8 = if image.color().has_color() { 3 } else { 1 };
        self.calls.lock().unwrap().push(EncodeCall {
            width,
            height,
            channels,
            quality,
        });

        let body = (width as f32 * height as f32 * channels as f32 * quality * self.factor) as usize;
        let mut out = Vec::with_capacity(13 + body);
        out.extend_from_slice(STUB_MAGIC);
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.push(channels);
        out.resize(13 + body, 0xAB);
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> Result<DynamicImage> {
        if data.len() < 13 || &data[..4] != STUB_MAGIC {
            return Err(Error::Decode("not a stub stream".to_string()));
        }
        let width = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let height = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
        Ok(match data[12] {
            1 => DynamicImage::new_luma8(width, height),
            _ => DynamicImage::new_rgb8(width, height),
        })
    }
}

/// Page widths of an output PDF in page order.
pub fn page_widths(pdf: &[u8]) -> Vec<f32> {
    let doc = Document::load_mem(pdf).expect("load output");
    doc.get_pages()
        .values()
        .map(|id| {
            let dict = doc.get_dictionary(*id).unwrap();
            let media_box = dict.get(b"MediaBox").unwrap().as_array().unwrap();
            media_box[2].as_float().unwrap()
        })
        .collect()
}

/// A stub rasterizer and codec wrapped for `Compressor::with_*`.
pub fn stubs() -> (Arc<StubRasterizer>, Arc<AreaCodec>) {
    (Arc::new(StubRasterizer::new()), Arc::new(AreaCodec::new()))
}
