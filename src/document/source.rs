//! Parsed view of the input PDF.
//!
//! The lopdf object graph is walked once at load time; what the compression
//! pipeline needs afterwards (page sizes, embedded-raster facts, the original
//! bytes) is kept as plain data so a `PdfSource` can be shared across worker
//! threads without locking.

use std::path::PathBuf;
use std::sync::Mutex;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};
use tempfile::NamedTempFile;

use crate::detect::{detect_format_from_bytes, PdfFormat};
use crate::error::{Error, Result};

/// US Letter in points, used when a page has no usable MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Guards against cyclic `/Parent` chains in malformed page trees.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Typed page-resource queries used by the page classifier.
pub trait PageInspector {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Whether the page's resources reference at least one image XObject.
    ///
    /// Returns an error when the resource dictionary is malformed or
    /// references a missing object.
    fn page_has_embedded_raster(&self, index: usize) -> Result<bool>;
}

#[derive(Debug, Clone)]
struct PageFacts {
    size: (f32, f32),
    embedded_raster: std::result::Result<bool, String>,
}

/// An input PDF, validated and indexed by 0-based page number.
#[derive(Debug)]
pub struct PdfSource<'a> {
    bytes: &'a [u8],
    format: PdfFormat,
    pages: Vec<PageFacts>,
    spill: Mutex<Option<NamedTempFile>>,
}

impl<'a> PdfSource<'a> {
    /// Parse and validate a PDF held in memory.
    ///
    /// Fails with a validation error when the header is not PDF, the object
    /// graph cannot be parsed, the document is encrypted, or it has no pages.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        let format = detect_format_from_bytes(bytes)?;
        let doc = LopdfDocument::load_mem(bytes)?;

        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }

        let page_ids = doc.get_pages();
        if page_ids.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let pages = page_ids
            .values()
            .map(|&page_id| PageFacts {
                size: page_size(&doc, page_id),
                embedded_raster: page_has_image_xobject(&doc, page_id).map_err(|e| e.to_string()),
            })
            .collect();

        Ok(Self {
            bytes,
            format,
            pages,
            spill: Mutex::new(None),
        })
    }

    /// The original, untouched input bytes.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Size of the original input in bytes.
    pub fn original_len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// PDF version from the file header.
    pub fn version(&self) -> &str {
        &self.format.version
    }

    /// Page size in points (width, height).
    pub fn page_size(&self, index: usize) -> Result<(f32, f32)> {
        self.pages
            .get(index)
            .map(|p| p.size)
            .ok_or(Error::PageOutOfRange(index, self.pages.len()))
    }

    /// Path of a temp-file copy of the input, written on first use.
    ///
    /// The file lives as long as this `PdfSource` and is removed on drop.
    pub fn spill_path(&self) -> Result<PathBuf> {
        let mut guard = self
            .spill
            .lock()
            .map_err(|_| Error::Other("spill lock poisoned".to_string()))?;

        if let Some(file) = guard.as_ref() {
            return Ok(file.path().to_path_buf());
        }

        let mut file = tempfile::Builder::new()
            .prefix("pdfsqueeze-")
            .suffix(".pdf")
            .tempfile()?;
        std::io::Write::write_all(&mut file, self.bytes)?;
        let path = file.path().to_path_buf();
        *guard = Some(file);
        Ok(path)
    }
}

impl PageInspector for PdfSource<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_has_embedded_raster(&self, index: usize) -> Result<bool> {
        let page = self
            .pages
            .get(index)
            .ok_or(Error::PageOutOfRange(index, self.pages.len()))?;
        page.embedded_raster.clone().map_err(Error::PdfParse)
    }
}

fn resolve<'d>(doc: &'d LopdfDocument, obj: &'d Object) -> Result<&'d Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Look up a page attribute, following `/Parent` for inheritable keys.
fn inherited<'d>(
    doc: &'d LopdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'d Object>> {
    let mut dict: &Dictionary = doc.get_dictionary(page_id)?;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = dict.get(key) {
            return Ok(Some(resolve(doc, value)?));
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => dict = doc.get_dictionary(parent)?,
            Err(_) => return Ok(None),
        }
    }

    Err(Error::PdfParse("page tree is too deep or cyclic".to_string()))
}

fn page_size(doc: &LopdfDocument, page_id: ObjectId) -> (f32, f32) {
    let media_box = match inherited(doc, page_id, b"MediaBox") {
        Ok(Some(obj)) => obj,
        _ => return DEFAULT_PAGE_SIZE,
    };

    let coords: Vec<f32> = match media_box.as_array() {
        Ok(array) => array
            .iter()
            .filter_map(|v| resolve(doc, v).ok())
            .filter_map(|v| v.as_float().ok())
            .collect(),
        Err(_) => return DEFAULT_PAGE_SIZE,
    };

    match coords.as_slice() {
        [x0, y0, x1, y1] if (x1 - x0).abs() > 0.0 && (y1 - y0).abs() > 0.0 => {
            ((x1 - x0).abs(), (y1 - y0).abs())
        }
        _ => DEFAULT_PAGE_SIZE,
    }
}

fn page_has_image_xobject(doc: &LopdfDocument, page_id: ObjectId) -> Result<bool> {
    let resources = match inherited(doc, page_id, b"Resources")? {
        Some(obj) => obj.as_dict()?,
        None => return Ok(false),
    };

    let xobjects = match resources.get(b"XObject") {
        Ok(obj) => resolve(doc, obj)?.as_dict()?,
        Err(_) => return Ok(false),
    };

    for (_, entry) in xobjects.iter() {
        let stream = resolve(doc, entry)?.as_stream()?;
        if let Ok(subtype) = stream.dict.get(b"Subtype") {
            if subtype.as_name()? == b"Image" {
                return Ok(true);
            }
        }
    }

    Ok(false)
}
