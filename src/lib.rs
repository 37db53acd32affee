//! # pdfsqueeze
//!
//! Size-targeted PDF compression for Rust.
//!
//! Every page is re-rendered to a raster and re-encoded as JPEG, trying
//! progressively more aggressive settings until the document fits the
//! requested size. The result is never larger than the input.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfsqueeze::compress_file_to;
//!
//! fn main() -> pdfsqueeze::Result<()> {
//!     // Shrink to roughly 200 KB
//!     let outcome = compress_file_to("scan.pdf", "scan_small.pdf", 200)?;
//!     println!("{} -> {} bytes", outcome.original_size, outcome.output_size);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Adaptive search**: mild tiers first, early exit once the budget fits
//! - **Single pass for large inputs**: one tier picked from the size ratio
//! - **Page-aware**: scanned pages keep color and resolution, text pages may
//!   be grayed and downscaled
//! - **Parallel processing**: pages are transcoded on a Rayon pool
//! - **Never inflates**: falls back to the original bytes
//!
//! Rendering uses poppler's `pdftoppm` by default; any [`Rasterizer`] can be
//! plugged in instead.

pub mod backend;
pub mod compressor;
pub mod detect;
pub mod document;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod policy;

#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export commonly used types
pub use backend::{
    Assembler, Codec, ImagePdfWriter, JpegCodec, LopdfAssembler, PageColor, PdftoppmRasterizer,
    Rasterizer, RenderedPage,
};
pub use compressor::{CompressionOutcome, CompressionPlan, Compressor};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf_bytes, PdfFormat};
pub use document::{PageClassification, PageInspector, PdfSource};
pub use error::{Error, Result};
pub use options::CompressOptions;
pub use pipeline::{CancellationToken, Strategy, TrialRecord};
pub use policy::{
    select_best, select_best_by_size, Candidate, CompressionTier, DirectBand, SelectionReason,
    TargetBudget, MIN_TARGET_KB, SEARCH_TIERS,
};

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Compress PDF bytes to at most `target_kb` KiB where possible.
///
/// # Arguments
///
/// * `data` - PDF file content as bytes
/// * `target_kb` - Size budget in KiB (clamped to at least 20)
///
/// # Example
///
/// ```no_run
/// use pdfsqueeze::compress_bytes;
///
/// let data = std::fs::read("scan.pdf").unwrap();
/// let smaller = compress_bytes(&data, 100).unwrap();
/// assert!(smaller.len() <= data.len());
/// ```
pub fn compress_bytes(data: &[u8], target_kb: u32) -> Result<Vec<u8>> {
    compress_bytes_with_options(data, target_kb, CompressOptions::default())
        .map(CompressionOutcome::into_bytes)
}

/// Compress PDF bytes with custom options, returning the full report.
pub fn compress_bytes_with_options(
    data: &[u8],
    target_kb: u32,
    options: CompressOptions,
) -> Result<CompressionOutcome> {
    Compressor::new(options)?.compress(data, target_kb)
}

/// Compress a PDF file, returning the output bytes and report.
///
/// # Example
///
/// ```no_run
/// use pdfsqueeze::compress_file;
///
/// let outcome = compress_file("scan.pdf", 100).unwrap();
/// std::fs::write("scan_compressed.pdf", outcome.bytes()).unwrap();
/// ```
pub fn compress_file<P: AsRef<Path>>(path: P, target_kb: u32) -> Result<CompressionOutcome> {
    let data = std::fs::read(path)?;
    compress_bytes_with_options(&data, target_kb, CompressOptions::default())
}

/// Compress a PDF file and write the result to `output`.
pub fn compress_file_to<P: AsRef<Path>, Q: AsRef<Path>>(
    path: P,
    output: Q,
    target_kb: u32,
) -> Result<CompressionOutcome> {
    let outcome = compress_file(path, target_kb)?;
    std::fs::write(output, outcome.bytes())?;
    Ok(outcome)
}

/// Output file name for a compressed copy of `input`.
///
/// A trailing `.pdf` (any case) is replaced by `_compressed.pdf`; other
/// names get the suffix appended. The result sits next to the input.
///
/// # Example
///
/// ```
/// use pdfsqueeze::default_output_name;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     default_output_name("docs/Report.PDF"),
///     PathBuf::from("docs/Report_compressed.pdf")
/// );
/// ```
pub fn default_output_name<P: AsRef<Path>>(input: P) -> PathBuf {
    let input = input.as_ref();
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let re = Regex::new(r"(?i)\.pdf$").unwrap();
    let stem = re.replace(&name, "");
    let stem = if stem.is_empty() { "document" } else { stem.as_ref() };

    input.with_file_name(format!("{}_compressed.pdf", stem))
}

/// Builder for configuring and running compression.
///
/// # Example
///
/// ```no_run
/// use pdfsqueeze::Squeeze;
///
/// let outcome = Squeeze::new()
///     .with_threads(4)
///     .with_target_kb(150)
///     .compress_file("scan.pdf")?;
/// println!("{}", outcome.strategy);
/// # Ok::<(), pdfsqueeze::Error>(())
/// ```
pub struct Squeeze {
    options: CompressOptions,
    target_kb: u32,
    rasterizer: Option<Arc<dyn Rasterizer>>,
}

impl Squeeze {
    /// Default budget when none is set, in KiB.
    pub const DEFAULT_TARGET_KB: u32 = 100;

    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            options: CompressOptions::default(),
            target_kb: Self::DEFAULT_TARGET_KB,
            rasterizer: None,
        }
    }

    /// Set the size budget in KiB.
    pub fn with_target_kb(mut self, target_kb: u32) -> Self {
        self.target_kb = target_kb;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Set the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.options = self.options.with_threads(threads);
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.options = self.options.with_cancellation(token);
        self
    }

    /// Use a custom rasterizer instead of `pdftoppm`.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Use a specific `pdftoppm` binary.
    pub fn with_pdftoppm(self, program: impl Into<PathBuf>) -> Self {
        self.with_rasterizer(Arc::new(PdftoppmRasterizer::with_program(program)))
    }

    /// Build the configured compressor.
    pub fn build(self) -> Result<Compressor> {
        let compressor = Compressor::new(self.options)?;
        Ok(match self.rasterizer {
            Some(rasterizer) => compressor.with_rasterizer(rasterizer),
            None => compressor,
        })
    }

    /// Compress PDF bytes.
    pub fn compress(self, data: &[u8]) -> Result<CompressionOutcome> {
        let target_kb = self.target_kb;
        self.build()?.compress(data, target_kb)
    }

    /// Compress a PDF file.
    pub fn compress_file<P: AsRef<Path>>(self, path: P) -> Result<CompressionOutcome> {
        let data = std::fs::read(path)?;
        self.compress(&data)
    }
}

impl Default for Squeeze {
    fn default() -> Self {
        Self::new()
    }
}

/// Compress PDF bytes on Tokio's blocking pool.
///
/// Rendering is CPU- and process-bound, so the work never runs on the async
/// executor threads.
#[cfg(feature = "async")]
pub async fn compress_bytes_async(
    compressor: Arc<Compressor>,
    data: Vec<u8>,
    target_kb: u32,
) -> Result<CompressionOutcome> {
    tokio::task::spawn_blocking(move || compressor.compress(&data, target_kb))
        .await
        .map_err(|e| Error::Other(format!("compression task failed: {}", e)))?
}

/// Read and compress a PDF file without blocking the async executor.
#[cfg(feature = "async")]
pub async fn compress_file_async<P: AsRef<Path>>(
    path: P,
    target_kb: u32,
) -> Result<CompressionOutcome> {
    let data = tokio::fs::read(path).await?;
    let compressor = Arc::new(Compressor::new(CompressOptions::default())?);
    compress_bytes_async(compressor, data, target_kb).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squeeze_builder() {
        let squeeze = Squeeze::new().sequential().with_target_kb(250);

        assert!(!squeeze.options.parallel);
        assert_eq!(squeeze.target_kb, 250);
        assert!(squeeze.rasterizer.is_none());
    }

    #[test]
    fn test_squeeze_builder_default() {
        let builder = Squeeze::default();
        assert_eq!(builder.target_kb, 100);
        assert!(builder.options.parallel);
    }

    #[test]
    fn test_squeeze_builder_with_pdftoppm() {
        let builder = Squeeze::new().with_pdftoppm("/opt/poppler/bin/pdftoppm");
        assert!(builder.rasterizer.is_some());
    }

    #[test]
    fn test_squeeze_build_rejects_zero_threads() {
        let result = Squeeze::new().with_threads(0).build();
        assert!(matches!(result, Err(Error::InvalidOption(_))));
    }

    // ==================== Edge Case Tests ====================

    #[test]
    fn test_compress_bytes_empty_data() {
        let data: [u8; 0] = [];
        let result = compress_bytes(&data, 100);
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_compress_bytes_too_short() {
        let result = compress_bytes(b"%PDF", 100);
        assert!(result.is_err());
    }

    #[test]
    fn test_compress_bytes_unknown_magic() {
        let data = [0xFF, 0xFE, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let result = compress_bytes(&data, 100);
        assert!(result.unwrap_err().is_validation());
    }

    #[test]
    fn test_compress_bytes_truncated_pdf() {
        // Valid header, but the body is large enough to skip the
        // already-small shortcut and cannot be parsed.
        let mut data = b"%PDF-1.7\n".to_vec();
        data.resize(64 * 1024, b'x');
        let result = compress_bytes(&data, 20);
        assert!(result.unwrap_err().is_validation());
    }

    #[test]
    fn test_compress_file_missing() {
        let result = compress_file("/nonexistent/input.pdf", 100);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    // ==================== Output Name Tests ====================

    #[test]
    fn test_default_output_name() {
        assert_eq!(
            default_output_name("scan.pdf"),
            PathBuf::from("scan_compressed.pdf")
        );
        assert_eq!(
            default_output_name("dir/Scan.Pdf"),
            PathBuf::from("dir/Scan_compressed.pdf")
        );
        assert_eq!(
            default_output_name("notes.pdf.bak"),
            PathBuf::from("notes.pdf.bak_compressed.pdf")
        );
        assert_eq!(
            default_output_name("report"),
            PathBuf::from("report_compressed.pdf")
        );
    }

    #[test]
    fn test_default_output_name_bare_extension() {
        assert_eq!(
            default_output_name(".pdf"),
            PathBuf::from("document_compressed.pdf")
        );
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_compress_bytes_async_small_input() {
        let data = crate::backend::assembler::tests::one_page_pdf(16, 16);
        let compressor = Arc::new(Compressor::new(CompressOptions::new().sequential()).unwrap());
        let outcome = compress_bytes_async(compressor, data.clone(), 100)
            .await
            .unwrap();
        assert_eq!(outcome.into_bytes(), data);
    }
}
