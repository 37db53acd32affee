//! Page rasterization.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::{DynamicImage, ImageFormat};

use crate::document::PdfSource;
use crate::error::{Error, Result};

/// Renders one page of a source document into a pixel buffer.
///
/// Implementations must be deterministic for a fixed (document, page, dpi)
/// and safe to call from several worker threads at once.
pub trait Rasterizer: Send + Sync {
    /// Render page `page_index` (0-based) at `dpi`.
    fn render(&self, source: &PdfSource<'_>, page_index: usize, dpi: u32) -> Result<DynamicImage>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
///
/// The source is spilled to a temp file once per document; each call renders
/// a single page to PNG on stdout.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
}

impl PdftoppmRasterizer {
    /// Use `pdftoppm` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("pdftoppm")
    }

    /// Use a specific `pdftoppm` executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The executable this rasterizer runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Whether the executable can be launched.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-v")
            .output()
            .map(|out| out.status.success() || !out.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn render(&self, source: &PdfSource<'_>, page_index: usize, dpi: u32) -> Result<DynamicImage> {
        let render_err = |message: String| Error::Render {
            page: page_index,
            message,
        };

        let path = source
            .spill_path()
            .map_err(|e| render_err(format!("cannot spill source: {}", e)))?;
        let page_number = (page_index + 1).to_string();

        let output = Command::new(&self.program)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-singlefile")
            .arg(&path)
            .output()
            .map_err(|e| render_err(format!("cannot run {}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            return Err(render_err(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)
            .map_err(|e| render_err(format!("unreadable raster: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_a_render_error() {
        let bytes = crate::backend::assembler::tests::one_page_pdf(40, 40);
        let source = PdfSource::from_bytes(&bytes).unwrap();
        let rasterizer = PdftoppmRasterizer::with_program("/nonexistent/pdftoppm-for-tests");

        assert!(!rasterizer.is_available());
        let err = rasterizer.render(&source, 0, 72).unwrap_err();
        assert!(matches!(err, Error::Render { page: 0, .. }));
    }

    #[test]
    fn test_default_program() {
        assert_eq!(PdftoppmRasterizer::default().program(), Path::new("pdftoppm"));
    }
}
