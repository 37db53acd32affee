//! Error types for pdfsqueeze library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfsqueeze operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while compressing a PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The PDF document has no pages.
    #[error("Document has no pages")]
    EmptyDocument,

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// The rasterizer failed on a page.
    #[error("Rendering page {page} failed: {message}")]
    Render { page: usize, message: String },

    /// The codec failed to encode a raster.
    #[error("Encoding error: {0}")]
    Encode(String),

    /// The codec failed to decode its own output.
    #[error("Decoding error: {0}")]
    Decode(String),

    /// The assembler failed to build or serialize the output document.
    #[error("Assembly error: {0}")]
    Assemble(String),

    /// The request was cancelled before it completed.
    #[error("Compression cancelled")]
    Cancelled,

    /// An option value is out of range.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error means the input document itself was rejected.
    ///
    /// Validation errors are never retried; every other error comes from a
    /// collaborator (rasterizer, codec, assembler) or the environment.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::PdfParse(_)
                | Error::Encrypted
                | Error::EmptyDocument
        )
    }

    /// Whether this error aborts a single trial but leaves later tiers viable.
    pub(crate) fn is_trial_failure(&self) -> bool {
        matches!(
            self,
            Error::Render { .. } | Error::Encode(_) | Error::Decode(_) | Error::Assemble(_)
        )
    }

    /// Recast a rasterizer failure as a page-level [`Error::Render`].
    pub(crate) fn into_render(self, page: usize) -> Self {
        match self {
            Error::Cancelled | Error::Render { .. } => self,
            other => Error::Render {
                page,
                message: other.to_string(),
            },
        }
    }

    /// Recast a codec failure on the encode side as [`Error::Encode`].
    pub(crate) fn into_encode(self) -> Self {
        match self {
            Error::Cancelled | Error::Encode(_) => self,
            other => Error::Encode(other.to_string()),
        }
    }

    /// Recast a codec failure on the decode side as [`Error::Decode`].
    pub(crate) fn into_decode(self) -> Self {
        match self {
            Error::Cancelled | Error::Decode(_) => self,
            other => Error::Decode(other.to_string()),
        }
    }

    /// Recast an assembler failure as [`Error::Assemble`].
    pub(crate) fn into_assemble(self) -> Self {
        match self {
            Error::Cancelled | Error::Assemble(_) => self,
            other => Error::Assemble(other.to_string()),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::PdfParse(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(e) => Error::Encode(e.to_string()),
            image::ImageError::IoError(e) => Error::Io(e),
            other => Error::Decode(other.to_string()),
        }
    }
}
