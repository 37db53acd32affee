//! Strategy selection and execution.

use serde::Serialize;

use super::trial::TrialRunner;
use crate::error::{Error, Result};
use crate::policy::{
    select_best, Candidate, CompressionTier, DirectBand, SelectionReason, TargetBudget,
    SEARCH_TIERS,
};

/// Inputs at or above this size skip the tier search.
pub const LARGE_BYTES_THRESHOLD: u64 = 8 * 1024 * 1024;

/// Inputs with at least this many pages skip the tier search.
pub const LARGE_PAGE_THRESHOLD: usize = 30;

/// Size limits that route a request to a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingThresholds {
    /// Byte size at which a document counts as large.
    pub large_bytes: u64,
    /// Page count at which a document counts as large.
    pub large_pages: usize,
}

impl Default for RoutingThresholds {
    fn default() -> Self {
        Self {
            large_bytes: LARGE_BYTES_THRESHOLD,
            large_pages: LARGE_PAGE_THRESHOLD,
        }
    }
}

/// How a request is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Strategy {
    /// The input already fits; it is returned unchanged.
    AlreadySmall,
    /// One trial at a tier picked from the target/original ratio.
    SinglePass {
        /// Band chosen from the ratio.
        band: DirectBand,
    },
    /// Walk [`SEARCH_TIERS`] until a trial fits, then fall back to best-fit.
    MultiStep,
}

impl Strategy {
    /// Pick a strategy. Rules are checked in order: already small, large
    /// (bytes or pages), otherwise search.
    pub fn select(
        original_size: u64,
        page_count: usize,
        budget: TargetBudget,
        thresholds: &RoutingThresholds,
    ) -> Self {
        if budget.fits(original_size) {
            Strategy::AlreadySmall
        } else if original_size >= thresholds.large_bytes || page_count >= thresholds.large_pages {
            Strategy::SinglePass {
                band: DirectBand::from_ratio(budget.ratio_to(original_size)),
            }
        } else {
            Strategy::MultiStep
        }
    }

    /// Run the trials this strategy calls for.
    ///
    /// Returns `Ok(None)` for [`Strategy::AlreadySmall`], which never runs a
    /// trial.
    pub fn execute<R: TrialRunner + ?Sized>(
        &self,
        runner: &R,
        budget: TargetBudget,
    ) -> Result<Option<Selection>> {
        match self {
            Strategy::AlreadySmall => Ok(None),
            Strategy::SinglePass { band } => run_single_pass(runner, *band).map(Some),
            Strategy::MultiStep => run_multi_step(runner, budget).map(Some),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::AlreadySmall => write!(f, "already small"),
            Strategy::SinglePass { band } => write!(f, "single pass ({})", band),
            Strategy::MultiStep => write!(f, "multi-step search"),
        }
    }
}

/// Outcome of one trial, kept for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    /// Tier the trial ran with.
    pub tier: CompressionTier,
    /// Output size, when the trial succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Failure message, when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The candidate a strategy settled on.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Chosen candidate.
    pub candidate: Candidate,
    /// Why it was chosen.
    pub reason: SelectionReason,
    /// Every trial run, in order.
    pub trials: Vec<TrialRecord>,
}

/// One trial at the band's tier, returned as is.
pub fn run_single_pass<R: TrialRunner + ?Sized>(runner: &R, band: DirectBand) -> Result<Selection> {
    let tier = band.tier();
    let candidate = runner.run_trial(&tier)?;

    Ok(Selection {
        trials: vec![TrialRecord {
            tier,
            size: Some(candidate.size()),
            error: None,
        }],
        candidate,
        reason: SelectionReason::SinglePass,
    })
}

/// Search [`SEARCH_TIERS`] in order.
///
/// The first candidate within the budget is returned immediately. Failed
/// trials are skipped, except cancellation and non-trial errors which end the
/// search. If every trial failed, the last failure is returned.
pub fn run_multi_step<R: TrialRunner + ?Sized>(
    runner: &R,
    budget: TargetBudget,
) -> Result<Selection> {
    let mut candidates: Vec<Candidate> = Vec::with_capacity(SEARCH_TIERS.len());
    let mut trials = Vec::with_capacity(SEARCH_TIERS.len());
    let mut last_error: Option<Error> = None;

    for (step, tier) in SEARCH_TIERS.iter().enumerate() {
        match runner.run_trial(tier) {
            Ok(candidate) => {
                trials.push(TrialRecord {
                    tier: *tier,
                    size: Some(candidate.size()),
                    error: None,
                });
                if budget.fits(candidate.size()) {
                    log::info!(
                        "Step {} [{}] fits {} with {} bytes",
                        step,
                        tier,
                        budget,
                        candidate.size()
                    );
                    return Ok(Selection {
                        candidate,
                        reason: SelectionReason::EarlyExit,
                        trials,
                    });
                }
                candidates.push(candidate);
            }
            Err(e) if e.is_trial_failure() => {
                log::warn!("Step {} [{}] failed, trying next tier: {}", step, tier, e);
                trials.push(TrialRecord {
                    tier: *tier,
                    size: None,
                    error: Some(e.to_string()),
                });
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    let Some((index, reason)) = select_best(&candidates, budget) else {
        return Err(last_error
            .unwrap_or_else(|| Error::Other("no compression tiers were tried".to_string())));
    };
    let candidate = candidates.swap_remove(index);
    log::info!(
        "No tier fit {}; chose [{}] with {} bytes ({})",
        budget,
        candidate.tier,
        candidate.size(),
        reason
    );

    Ok(Selection {
        candidate,
        reason,
        trials,
    })
}
