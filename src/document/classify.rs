//! Scanned-vs-text page classification.

use serde::Serialize;

use super::source::PageInspector;

/// How a page's content is dominated, used to bias transcoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageClassification {
    /// The page embeds at least one raster image (typically a scan).
    ImageHeavy,
    /// Text and vector content only.
    TextLike,
}

impl PageClassification {
    /// Whether this page must be kept at full size and in color.
    pub fn is_image_heavy(self) -> bool {
        self == PageClassification::ImageHeavy
    }
}

impl std::fmt::Display for PageClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageClassification::ImageHeavy => write!(f, "image-heavy"),
            PageClassification::TextLike => write!(f, "text-like"),
        }
    }
}

/// Classify a single page.
///
/// Inspection failures fall back to [`PageClassification::ImageHeavy`].
pub fn classify<I: PageInspector + ?Sized>(inspector: &I, page_index: usize) -> PageClassification {
    match inspector.page_has_embedded_raster(page_index) {
        Ok(true) => PageClassification::ImageHeavy,
        Ok(false) => PageClassification::TextLike,
        Err(e) => {
            log::debug!(
                "Page {} inspection failed, treating as image-heavy: {}",
                page_index,
                e
            );
            PageClassification::ImageHeavy
        }
    }
}

/// Classify every page once, indexed by page number.
pub fn classify_all<I: PageInspector + ?Sized>(inspector: &I) -> Vec<PageClassification> {
    (0..inspector.page_count())
        .map(|index| classify(inspector, index))
        .collect()
}
