//! Best-fit selection among trial candidates.

use serde::Serialize;

use super::budget::TargetBudget;
use super::tier::CompressionTier;

/// The measured output of one trial.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Tier the trial ran with.
    pub tier: CompressionTier,
    /// Serialized output document.
    pub bytes: Vec<u8>,
}

impl Candidate {
    /// Wrap trial output.
    pub fn new(tier: CompressionTier, bytes: Vec<u8>) -> Self {
        Self { tier, bytes }
    }

    /// Output size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Why a candidate was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// The search stopped at the first tier that met the budget.
    EarlyExit,
    /// The single-pass tier's output, returned without comparison.
    SinglePass,
    /// Largest candidate within the budget.
    WithinBudget,
    /// Smallest candidate within the 10% allowance.
    WithinAllowance,
    /// Smallest candidate overall.
    Smallest,
}

impl std::fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SelectionReason::EarlyExit => "first tier within budget",
            SelectionReason::SinglePass => "single pass",
            SelectionReason::WithinBudget => "best quality within budget",
            SelectionReason::WithinAllowance => "within 10% allowance",
            SelectionReason::Smallest => "smallest available",
        };
        f.write_str(text)
    }
}

/// Pick the index of the candidate to return when no early exit happened.
///
/// Rules, first match wins (ties go to the earlier tier):
/// 1. largest size `<= target`;
/// 2. smallest size `<= target * 1.10`;
/// 3. smallest size overall.
///
/// Returns `None` only for an empty slice.
pub fn select_best(
    candidates: &[Candidate],
    budget: TargetBudget,
) -> Option<(usize, SelectionReason)> {
    let sizes: Vec<u64> = candidates.iter().map(Candidate::size).collect();
    select_best_by_size(&sizes, budget)
}

/// [`select_best`] over bare sizes.
pub fn select_best_by_size(sizes: &[u64], budget: TargetBudget) -> Option<(usize, SelectionReason)> {
    let mut within: Option<usize> = None;
    for (i, &size) in sizes.iter().enumerate() {
        if budget.fits(size) && within.map_or(true, |best| size > sizes[best]) {
            within = Some(i);
        }
    }
    if let Some(i) = within {
        return Some((i, SelectionReason::WithinBudget));
    }

    let allowance = budget.allowance();
    let mut relaxed: Option<usize> = None;
    for (i, &size) in sizes.iter().enumerate() {
        if size <= allowance && relaxed.map_or(true, |best| size < sizes[best]) {
            relaxed = Some(i);
        }
    }
    if let Some(i) = relaxed {
        return Some((i, SelectionReason::WithinAllowance));
    }

    let mut smallest: Option<usize> = None;
    for (i, &size) in sizes.iter().enumerate() {
        if smallest.map_or(true, |best| size < sizes[best]) {
            smallest = Some(i);
        }
    }
    smallest.map(|i| (i, SelectionReason::Smallest))
}
