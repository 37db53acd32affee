//! Size-targeted compression controller.

use std::sync::Arc;

use rayon::ThreadPool;
use serde::Serialize;

use crate::backend::{Assembler, Codec, JpegCodec, LopdfAssembler, PdftoppmRasterizer, Rasterizer};
use crate::detect::detect_format_from_bytes;
use crate::document::{classify_all, PageClassification, PageInspector, PdfSource};
use crate::error::{Error, Result};
use crate::options::CompressOptions;
use crate::pipeline::{PageTranscoder, Strategy, TrialExecutor, TrialRecord};
use crate::policy::{CompressionTier, SelectionReason, TargetBudget};

/// Reduces PDFs to fit a byte budget by re-rendering their pages.
///
/// A `Compressor` holds no per-request state and can serve concurrent
/// requests; its worker pool is shared between them.
///
/// # Example
///
/// ```no_run
/// use pdfsqueeze::{CompressOptions, Compressor};
///
/// let compressor = Compressor::new(CompressOptions::default())?;
/// let data = std::fs::read("scan.pdf")?;
/// let outcome = compressor.compress(&data, 200)?;
/// println!("{} -> {} bytes", outcome.original_size, outcome.output_size);
/// # Ok::<(), pdfsqueeze::Error>(())
/// ```
pub struct Compressor {
    options: CompressOptions,
    rasterizer: Arc<dyn Rasterizer>,
    codec: Arc<dyn Codec>,
    assembler: Arc<dyn Assembler>,
    pool: Option<Arc<ThreadPool>>,
}

impl Compressor {
    /// Create a compressor with the shipped collaborators.
    ///
    /// A worker pool is built when `options.parallel` is set.
    pub fn new(options: CompressOptions) -> Result<Self> {
        options.validate()?;

        let pool = if options.parallel {
            Some(Arc::new(build_pool(options.threads)?))
        } else {
            None
        };

        Ok(Self {
            options,
            rasterizer: Arc::new(PdftoppmRasterizer::new()),
            codec: Arc::new(JpegCodec::new()),
            assembler: Arc::new(LopdfAssembler::new()),
            pool,
        })
    }

    /// Replace the page rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Replace the raster codec.
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the document assembler.
    pub fn with_assembler(mut self, assembler: Arc<dyn Assembler>) -> Self {
        self.assembler = assembler;
        self
    }

    /// Run page transcoding on an existing pool.
    ///
    /// Overrides `options.parallel`.
    pub fn with_thread_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// The options this compressor was built with.
    pub fn options(&self) -> &CompressOptions {
        &self.options
    }

    /// Whether pages are transcoded on a worker pool.
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Inspect a document and report what [`Compressor::compress`] would do,
    /// without rendering anything.
    pub fn plan(&self, data: &[u8], target_kb: u32) -> Result<CompressionPlan> {
        let source = PdfSource::from_bytes(data)?;
        let budget = TargetBudget::from_kb(target_kb);
        let original_size = source.original_len();
        let page_count = source.page_count();

        Ok(CompressionPlan {
            version: source.version().to_string(),
            original_size,
            page_count,
            target: budget,
            strategy: Strategy::select(
                original_size,
                page_count,
                budget,
                &self.options.thresholds(),
            ),
            classifications: classify_all(&source),
        })
    }

    /// Compress `data` to at most `target_kb` KiB where possible.
    ///
    /// `target_kb` is clamped to [`crate::MIN_TARGET_KB`]. The result is
    /// never larger than the input: when no candidate beats the original,
    /// the original bytes are returned with `kept_original` set.
    pub fn compress(&self, data: &[u8], target_kb: u32) -> Result<CompressionOutcome> {
        detect_format_from_bytes(data)?;

        let budget = TargetBudget::from_kb(target_kb);
        let original_size = data.len() as u64;

        if budget.fits(original_size) {
            log::info!(
                "Input is {} bytes, already within {}; returning unchanged",
                original_size,
                budget
            );
            return Ok(CompressionOutcome::unchanged(
                data,
                budget,
                None,
                Strategy::AlreadySmall,
                Vec::new(),
            ));
        }

        self.check_cancelled()?;

        let source = PdfSource::from_bytes(data)?;
        let page_count = source.page_count();
        let strategy = Strategy::select(
            original_size,
            page_count,
            budget,
            &self.options.thresholds(),
        );
        log::info!(
            "Compressing {} pages, {} bytes to {}: {}",
            page_count,
            original_size,
            budget,
            strategy
        );

        let classifications = classify_all(&source);
        let transcoder = PageTranscoder::new(Arc::clone(&self.rasterizer), Arc::clone(&self.codec));
        let executor = TrialExecutor::new(
            &source,
            &classifications,
            &transcoder,
            self.assembler.as_ref(),
        )
        .with_pool(self.pool.as_deref())
        .with_cancellation(self.options.cancellation.clone());

        let Some(selection) = strategy.execute(&executor, budget)? else {
            return Ok(CompressionOutcome::unchanged(
                data,
                budget,
                Some(page_count),
                strategy,
                Vec::new(),
            ));
        };

        let candidate = selection.candidate;
        if candidate.size() >= original_size {
            log::info!(
                "Best candidate [{}] is {} bytes, not smaller than the original; keeping original",
                candidate.tier,
                candidate.size()
            );
            let mut outcome = CompressionOutcome::unchanged(
                data,
                budget,
                Some(page_count),
                strategy,
                selection.trials,
            );
            outcome.kept_original = true;
            return Ok(outcome);
        }

        log::info!(
            "Result: {} -> {} bytes with [{}] ({})",
            original_size,
            candidate.size(),
            candidate.tier,
            selection.reason
        );
        Ok(CompressionOutcome {
            original_size,
            output_size: candidate.size(),
            target: budget,
            page_count: Some(page_count),
            strategy,
            tier: Some(candidate.tier),
            reason: Some(selection.reason),
            trials: selection.trials,
            kept_original: false,
            bytes: candidate.bytes,
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.options.cancellation {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }
}

fn build_pool(threads: Option<usize>) -> Result<ThreadPool> {
    let threads = threads.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("pdfsqueeze-{}", i))
        .build()
        .map_err(|e| Error::Other(format!("failed to build worker pool: {}", e)))
}

/// Result of a compression request.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionOutcome {
    /// Input size in bytes.
    pub original_size: u64,
    /// Output size in bytes; never above `original_size`.
    pub output_size: u64,
    /// Effective budget after clamping.
    pub target: TargetBudget,
    /// Page count, when the document was parsed.
    pub page_count: Option<usize>,
    /// Mode the request ran in.
    pub strategy: Strategy,
    /// Tier of the returned candidate, unless the original was returned.
    pub tier: Option<CompressionTier>,
    /// Why the returned candidate was chosen.
    pub reason: Option<SelectionReason>,
    /// Every trial run, in order.
    pub trials: Vec<TrialRecord>,
    /// Trials ran but none beat the original size.
    pub kept_original: bool,
    #[serde(skip)]
    bytes: Vec<u8>,
}

impl CompressionOutcome {
    fn unchanged(
        data: &[u8],
        target: TargetBudget,
        page_count: Option<usize>,
        strategy: Strategy,
        trials: Vec<TrialRecord>,
    ) -> Self {
        Self {
            original_size: data.len() as u64,
            output_size: data.len() as u64,
            target,
            page_count,
            strategy,
            tier: None,
            reason: None,
            trials,
            kept_original: false,
            bytes: data.to_vec(),
        }
    }

    /// The output document.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the output document.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Whether the output is the input, byte for byte.
    pub fn is_unchanged(&self) -> bool {
        self.tier.is_none()
    }

    /// Whether the output fits the budget.
    pub fn met_target(&self) -> bool {
        self.target.fits(self.output_size)
    }

    /// Output size as a fraction of the input size.
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            return 1.0;
        }
        self.output_size as f64 / self.original_size as f64
    }
}

/// What a compression request would do, computed without rendering.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionPlan {
    /// PDF version from the header.
    pub version: String,
    /// Input size in bytes.
    pub original_size: u64,
    /// Number of pages.
    pub page_count: usize,
    /// Effective budget after clamping.
    pub target: TargetBudget,
    /// Mode the request would run in.
    pub strategy: Strategy,
    /// Per-page verdicts, in page order.
    pub classifications: Vec<PageClassification>,
}

impl CompressionPlan {
    /// Number of pages classified as image-heavy.
    pub fn image_heavy_pages(&self) -> usize {
        self.classifications
            .iter()
            .filter(|c| c.is_image_heavy())
            .count()
    }
}
