//! Image-only PDF assembly.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as LopdfDocument, Object, ObjectId, Stream, StringFormat};

use crate::error::{Error, Result};

/// Color model of a rendered page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageColor {
    /// Single-channel luma.
    Gray,
    /// Three-channel RGB.
    Rgb,
}

impl PageColor {
    fn color_space(self) -> &'static str {
        match self {
            PageColor::Gray => "DeviceGray",
            PageColor::Rgb => "DeviceRGB",
        }
    }
}

/// A full-page raster replacement, ready to be placed in an output document.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Source page index (0-based).
    pub index: usize,
    /// Encoded image stream (JPEG for the shipped codec).
    pub data: Vec<u8>,
    /// Width in pixels, which is also the page width in points.
    pub width: u32,
    /// Height in pixels, which is also the page height in points.
    pub height: u32,
    /// Color model of `data`.
    pub color: PageColor,
}

/// Builds an output document from full-page images.
pub trait Assembler: Send + Sync {
    /// Assemble pages in slice order and serialize the document.
    fn assemble(&self, pages: &[RenderedPage]) -> Result<Vec<u8>>;
}

/// [`Assembler`] writing one DCT-encoded image XObject per page with lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfAssembler;

impl LopdfAssembler {
    /// Create an assembler.
    pub fn new() -> Self {
        Self
    }
}

impl Assembler for LopdfAssembler {
    fn assemble(&self, pages: &[RenderedPage]) -> Result<Vec<u8>> {
        let mut writer = ImagePdfWriter::new();
        for page in pages {
            writer.add_page(page)?;
        }
        writer.finish()
    }
}

/// Incremental writer behind [`LopdfAssembler`].
pub struct ImagePdfWriter {
    doc: LopdfDocument,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl ImagePdfWriter {
    /// Start an empty document.
    pub fn new() -> Self {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page whose MediaBox matches the image's pixel size.
    pub fn add_page(&mut self, page: &RenderedPage) -> Result<()> {
        if page.width == 0 || page.height == 0 {
            return Err(Error::Assemble(format!(
                "page {} has an empty image",
                page.index
            )));
        }
        let (width, height) = (i64::from(page.width), i64::from(page.height));

        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => page.color.color_space(),
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            page.data.clone(),
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width.into(),
                        0.into(),
                        0.into(),
                        height.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| Error::Assemble(e.to_string()))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    /// Close the page tree and serialize.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.kids.is_empty() {
            return Err(Error::Assemble("no pages to assemble".to_string()));
        }

        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Producer" => Object::String(b"pdfsqueeze".to_vec(), StringFormat::Literal),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| Error::Assemble(e.to_string()))?;
        Ok(out)
    }
}

impl Default for ImagePdfWriter {
    fn default() -> Self {
        Self::new()
    }
}
