//! One full-document trial at a single tier.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::ThreadPool;

use super::cancel::CancellationToken;
use super::transcode::PageTranscoder;
use crate::backend::{Assembler, RenderedPage};
use crate::document::{PageClassification, PdfSource};
use crate::error::{Error, Result};
use crate::policy::{Candidate, CompressionTier};

/// Something that can turn a tier into a measured candidate.
///
/// Strategies only depend on this trait, so they can be driven by canned
/// sizes in tests.
pub trait TrialRunner {
    /// Produce one candidate for `tier`.
    fn run_trial(&self, tier: &CompressionTier) -> Result<Candidate>;
}

/// Transcodes every page at one tier, assembles them and measures the result.
pub struct TrialExecutor<'r, 'a> {
    source: &'r PdfSource<'a>,
    classifications: &'r [PageClassification],
    transcoder: &'r PageTranscoder,
    assembler: &'r dyn Assembler,
    pool: Option<&'r ThreadPool>,
    cancellation: Option<CancellationToken>,
}

impl<'r, 'a> TrialExecutor<'r, 'a> {
    /// Create a sequential executor.
    ///
    /// `classifications` must hold one verdict per page of `source`.
    pub fn new(
        source: &'r PdfSource<'a>,
        classifications: &'r [PageClassification],
        transcoder: &'r PageTranscoder,
        assembler: &'r dyn Assembler,
    ) -> Self {
        Self {
            source,
            classifications,
            transcoder,
            assembler,
            pool: None,
            cancellation: None,
        }
    }

    /// Transcode pages on `pool` instead of the calling thread.
    pub fn with_pool(mut self, pool: Option<&'r ThreadPool>) -> Self {
        self.pool = pool;
        self
    }

    /// Observe `token` before every page.
    pub fn with_cancellation(mut self, token: Option<CancellationToken>) -> Self {
        self.cancellation = token;
        self
    }

    /// Whether pages run on a worker pool.
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancellation {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }

    fn transcode_page(&self, index: usize, tier: &CompressionTier) -> Result<RenderedPage> {
        self.check_cancelled()?;
        self.transcoder
            .transcode(self.source, index, tier, self.classifications[index])
    }

    fn transcode_sequential(&self, tier: &CompressionTier) -> Result<Vec<RenderedPage>> {
        (0..self.classifications.len())
            .map(|index| self.transcode_page(index, tier))
            .collect()
    }

    fn transcode_parallel(
        &self,
        pool: &ThreadPool,
        tier: &CompressionTier,
    ) -> Result<Vec<RenderedPage>> {
        let count = self.classifications.len();
        let tier = *tier;
        let abort = AtomicBool::new(false);
        let (tx, rx) = crossbeam_channel::unbounded();

        pool.scope(|scope| {
            for index in 0..count {
                let tx = tx.clone();
                let abort = &abort;
                scope.spawn(move |_| {
                    if abort.load(Ordering::Relaxed) {
                        return;
                    }
                    let result = self.transcode_page(index, &tier);
                    if result.is_err() {
                        abort.store(true, Ordering::Relaxed);
                    }
                    let _ = tx.send((index, result));
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Option<RenderedPage>> = (0..count).map(|_| None).collect();
        let mut first_error: Option<(usize, Error)> = None;
        for (index, result) in rx.iter() {
            match result {
                Ok(page) => slots[index] = Some(page),
                Err(e) => {
                    if first_error.as_ref().map_or(true, |(seen, _)| index < *seen) {
                        first_error = Some((index, e));
                    }
                }
            }
        }

        self.check_cancelled()?;
        if let Some((_, e)) = first_error {
            return Err(e);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| Error::Other(format!("page {} produced no result", index)))
            })
            .collect()
    }
}

impl TrialRunner for TrialExecutor<'_, '_> {
    fn run_trial(&self, tier: &CompressionTier) -> Result<Candidate> {
        self.check_cancelled()?;

        let pages = match self.pool {
            Some(pool) => self.transcode_parallel(pool, tier)?,
            None => self.transcode_sequential(tier)?,
        };
        let bytes = self
            .assembler
            .assemble(&pages)
            .map_err(Error::into_assemble)?;
        drop(pages);

        log::debug!(
            "Trial [{}] over {} pages: {} bytes",
            tier,
            self.classifications.len(),
            bytes.len()
        );
        Ok(Candidate::new(*tier, bytes))
    }
}
