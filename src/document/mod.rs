//! Source document access and page classification.

mod classify;
mod source;

pub use classify::{classify, classify_all, PageClassification};
pub use source::{PageInspector, PdfSource};
