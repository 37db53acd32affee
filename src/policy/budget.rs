//! Target byte budget.

use serde::Serialize;

/// Smallest accepted target; lower requests are clamped up to it.
pub const MIN_TARGET_KB: u32 = 20;

/// Allowance over the target accepted by the best-fit fallback, in percent.
const ALLOWANCE_PERCENT: u64 = 110;

/// A size budget in bytes, never below [`MIN_TARGET_KB`] KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TargetBudget(u64);

impl TargetBudget {
    /// Budget for a requested size in KiB.
    pub fn from_kb(requested_kb: u32) -> Self {
        Self(u64::from(requested_kb.max(MIN_TARGET_KB)) * 1024)
    }

    /// Budget for an exact byte count, bypassing the minimum.
    ///
    /// Used by the selectors, which work on whatever budget they are given.
    pub fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// The budget in bytes.
    pub fn bytes(self) -> u64 {
        self.0
    }

    /// The relaxed bound used by the best-fit fallback (target plus 10%,
    /// rounded down).
    pub fn allowance(self) -> u64 {
        self.0.saturating_mul(ALLOWANCE_PERCENT) / 100
    }

    /// Whether a size fits the budget.
    pub fn fits(self, size: u64) -> bool {
        size <= self.0
    }

    /// Ratio of the budget to an original size.
    pub fn ratio_to(self, original: u64) -> f64 {
        if original == 0 {
            return f64::INFINITY;
        }
        self.0 as f64 / original as f64
    }
}

impl std::fmt::Display for TargetBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} KB", self.0 as f64 / 1024.0)
    }
}
