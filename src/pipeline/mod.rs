//! Compression pipeline: page transcoding, trials, and strategies.

mod cancel;
mod strategy;
mod transcode;
mod trial;

pub use cancel::CancellationToken;
pub use strategy::{
    run_multi_step, run_single_pass, RoutingThresholds, Selection, Strategy, TrialRecord,
    LARGE_BYTES_THRESHOLD, LARGE_PAGE_THRESHOLD,
};
pub use transcode::{effective_quality, scaled_dimensions, PageTranscoder};
pub use trial::{TrialExecutor, TrialRunner};
