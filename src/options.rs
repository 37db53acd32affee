//! Compression options and configuration.

use crate::error::{Error, Result};
use crate::pipeline::{
    CancellationToken, RoutingThresholds, LARGE_BYTES_THRESHOLD, LARGE_PAGE_THRESHOLD,
};

/// Options for a [`crate::Compressor`].
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Whether to transcode pages in parallel
    pub parallel: bool,

    /// Worker thread count (None = available parallelism)
    pub threads: Option<usize>,

    /// Input size at or above which a single trial is run
    pub large_bytes_threshold: u64,

    /// Page count at or above which a single trial is run
    pub large_page_threshold: usize,

    /// Token checked before every trial and page
    pub cancellation: Option<CancellationToken>,
}

impl CompressOptions {
    /// Create new compress options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Set the large-input byte threshold.
    pub fn with_large_bytes_threshold(mut self, bytes: u64) -> Self {
        self.large_bytes_threshold = bytes;
        self
    }

    /// Set the large-input page threshold.
    pub fn with_large_page_threshold(mut self, pages: usize) -> Self {
        self.large_page_threshold = pages;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Routing thresholds derived from these options.
    pub fn thresholds(&self) -> RoutingThresholds {
        RoutingThresholds {
            large_bytes: self.large_bytes_threshold,
            large_pages: self.large_page_threshold,
        }
    }

    /// Reject values the compressor cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(Error::InvalidOption(
                "threads must be at least 1".to_string(),
            ));
        }
        if self.large_page_threshold == 0 {
            return Err(Error::InvalidOption(
                "large page threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
            large_bytes_threshold: LARGE_BYTES_THRESHOLD,
            large_page_threshold: LARGE_PAGE_THRESHOLD,
            cancellation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_options_builder() {
        let options = CompressOptions::new()
            .sequential()
            .with_threads(3)
            .with_large_bytes_threshold(1024)
            .with_large_page_threshold(5);

        assert!(!options.parallel);
        assert_eq!(options.threads, Some(3));
        assert_eq!(
            options.thresholds(),
            RoutingThresholds {
                large_bytes: 1024,
                large_pages: 5
            }
        );
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_default_options() {
        let options = CompressOptions::default();
        assert!(options.parallel);
        assert_eq!(options.threads, None);
        assert_eq!(options.large_bytes_threshold, 8 * 1024 * 1024);
        assert_eq!(options.large_page_threshold, 30);
        assert!(options.cancellation.is_none());
    }

    #[test]
    fn test_validate() {
        assert!(matches!(
            CompressOptions::new().with_threads(0).validate(),
            Err(Error::InvalidOption(_))
        ));
        assert!(CompressOptions::new()
            .with_large_page_threshold(0)
            .validate()
            .is_err());
    }
}
