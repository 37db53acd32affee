//! Compression policy: tier catalogues, the byte budget, and best-fit
//! selection.
//!
//! Everything here is pure data and arithmetic; no rendering happens in this
//! module.

mod budget;
mod select;
mod tier;

pub use budget::{TargetBudget, MIN_TARGET_KB};
pub use select::{select_best, select_best_by_size, Candidate, SelectionReason};
pub use tier::{CompressionTier, DirectBand, SEARCH_TIERS};
